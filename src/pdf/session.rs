//! One open document and the state that lives exactly as long as it

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use lopdf::{Document, ObjectId};
use tracing::debug;
use crate::boxes::{analyze_page, BoxAnalysis, PageBoxSet};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::metrics::FontKind;
use crate::pdf::fonts;
use crate::pdf::page;

/// Geometry of one page as read at open time
#[derive(Debug, Clone)]
pub struct PageGeometry {
    pub id: ObjectId,
    pub boxes: PageBoxSet,
    pub analysis: BoxAnalysis,
}

/// An open document with its font cache and cancel token
pub struct Session {
    path: PathBuf,
    doc: Document,
    cancel: CancelToken,
    fonts: HashMap<FontKind, ObjectId>,
}

impl Session {
    /// Load a document, rejecting missing files and documents without pages.
    pub fn open(path: &Path, cancel: CancelToken) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let doc = Document::load(path)?;
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyDocument(path.to_path_buf()));
        }
        debug!(path = %path.display(), pages = doc.get_pages().len(), "opened document");

        Ok(Self {
            path: path.to_path_buf(),
            doc,
            cancel,
            fonts: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn page_ids(&self) -> Vec<ObjectId> {
        page::page_ids(&self.doc)
    }

    /// Fail with [`Error::Cancelled`] if the caller asked to stop.
    pub fn checkpoint(&self) -> Result<()> {
        self.cancel.check()
    }

    /// Font object for `kind`, added to the document on first use.
    pub fn font(&mut self, kind: FontKind) -> ObjectId {
        let doc = &mut self.doc;
        *self.fonts.entry(kind).or_insert_with(|| fonts::add_font(doc, kind))
    }

    /// Read and analyse every page in order.
    ///
    /// Read problems (malformed box arrays) are merged into each page's
    /// analysis. The cancel token is checked after every page.
    pub fn read_geometry(&self) -> Result<Vec<PageGeometry>> {
        let mut pages: Vec<PageGeometry> = Vec::new();
        for (index, id) in self.page_ids().into_iter().enumerate() {
            let (boxes, read_errors) = page::read_boxes(&self.doc, id, index);
            let rotation = page::read_rotation(&self.doc, id);
            let previous = pages.last().map(|p| p.analysis.effective);

            let mut analysis = analyze_page(index, &boxes, rotation, previous.as_ref());
            let mut errors = read_errors;
            errors.append(&mut analysis.errors);
            analysis.errors = errors;
            pages.push(PageGeometry { id, boxes, analysis });

            self.checkpoint()?;
        }
        Ok(pages)
    }

    /// Hand the document over for output.
    pub fn into_document(self) -> Document {
        self.doc
    }
}
