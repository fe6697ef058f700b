//! Cursor-style pagination over result sets and embedded array fields.
//!
//! [`Pagination`] slices an in-memory result sequence into 1-indexed pages
//! with adjacency metadata and a windowed page-number iterator.
//! [`FieldPagination`] pages a single array-valued field of one document
//! through a [`DocumentLoader`]'s `$slice` projection, so the full array is
//! never materialized.
//!
//! Range errors are split into two kinds: [`DocJsonError::InvalidPage`] for a
//! page number below 1 and [`DocJsonError::PageOutOfRange`] for an empty page
//! past the first (page 1 of an empty sequence is always valid).

use bson::{Bson, Document as BsonDocument};

use crate::{
    document::DocumentLoader,
    error::{DocJsonError, DocJsonResult},
};

/// A single page of a paginated result sequence.
///
/// Holds an unskipped clone of the source sequence so that
/// [`prev`](Pagination::prev) and [`next`](Pagination::next) can re-slice it.
///
/// # Example
///
/// ```ignore
/// use docjson::page::paginate;
///
/// let page = paginate((1..=25).collect(), 2, 10)?;
/// assert_eq!(page.items, vec![11, 12, 13, 14, 15, 16, 17, 18, 19, 20]);
/// assert_eq!(page.pages(), 3);
/// assert!(page.has_prev() && page.has_next());
/// # Ok::<(), docjson::DocJsonError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pagination<T> {
    source: Vec<T>,
    /// The items on this page.
    pub items: Vec<T>,
    /// The current page number (1-indexed).
    pub page: usize,
    /// Number of items per page.
    pub per_page: usize,
    /// Total number of items across all pages.
    pub total: usize,
}

/// Paginates a result sequence.
///
/// # Errors
///
/// Returns [`DocJsonError::InvalidPage`] when `page` is below 1, and
/// [`DocJsonError::PageOutOfRange`] when the requested page is empty and not
/// the first.
pub fn paginate<T: Clone>(items: Vec<T>, page: usize, per_page: usize) -> DocJsonResult<Pagination<T>> {
    Pagination::new(items, page, per_page)
}

impl<T: Clone> Pagination<T> {
    /// Creates a page over `items`; see [`paginate`].
    pub fn new(items: Vec<T>, page: usize, per_page: usize) -> DocJsonResult<Self> {
        if page < 1 {
            return Err(DocJsonError::InvalidPage(page));
        }
        let start = (page - 1) * per_page;
        let end = (page * per_page).min(items.len());
        let slice: Vec<T> = if start < items.len() {
            items[start..end].to_vec()
        } else {
            Vec::new()
        };
        if slice.is_empty() && page != 1 {
            return Err(DocJsonError::PageOutOfRange(page));
        }
        Ok(Self {
            total: items.len(),
            source: items,
            items: slice,
            page,
            per_page,
        })
    }

    /// Returns the page of the previous page number.
    ///
    /// # Errors
    ///
    /// Fails with a range error when this is the first page.
    pub fn prev(&self) -> DocJsonResult<Self> {
        if !self.has_prev() {
            return Err(DocJsonError::PageOutOfRange(0));
        }
        Self::new(self.source.clone(), self.page - 1, self.per_page)
    }

    /// Returns the page of the next page number.
    ///
    /// # Errors
    ///
    /// Fails with a range error when this is the last page.
    pub fn next(&self) -> DocJsonResult<Self> {
        Self::new(self.source.clone(), self.page + 1, self.per_page)
    }
}

impl<T> Pagination<T> {
    /// Total number of pages.
    pub fn pages(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }

    /// Whether a previous page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// The previous page number, if any.
    pub fn prev_num(&self) -> Option<usize> {
        self.has_prev().then(|| self.page - 1)
    }

    /// Whether a further page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    /// The next page number, if any.
    pub fn next_num(&self) -> Option<usize> {
        self.has_next().then(|| self.page + 1)
    }

    /// Iterates page numbers for a pager widget: a left edge, a window around
    /// the current page, and a right edge, with `None` marking each gap
    /// between non-adjacent runs.
    ///
    /// With the defaults (2, 2, 3, 2) a 20-page result viewed from page 10
    /// yields `1, 2, None, 8, 9, 10, 11, 12, None, 19, 20`.
    pub fn iter_pages(
        &self,
        left_edge: usize,
        left_current: usize,
        right_current: usize,
        right_edge: usize,
    ) -> impl Iterator<Item = Option<usize>> + '_ {
        page_window(
            self.page,
            self.pages(),
            left_edge,
            left_current,
            right_current,
            right_edge,
        )
    }

    /// [`iter_pages`](Pagination::iter_pages) with the default edge and
    /// window sizes (2, 2, 3, 2).
    pub fn iter_pages_default(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.iter_pages(2, 2, 3, 2)
    }
}

/// Yields the page numbers for a pager widget over `pages` total pages
/// viewed from `page`, with `None` marking each gap between runs.
fn page_window(
    page: usize,
    pages: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> std::vec::IntoIter<Option<usize>> {
    let mut out = Vec::new();
    let mut last = 0usize;
    for num in 1..=pages {
        let in_left_edge = num <= left_edge;
        let in_window = num + left_current + 1 > page && num < page + right_current;
        let in_right_edge = num > pages.saturating_sub(right_edge);
        if in_left_edge || in_window || in_right_edge {
            if last + 1 != num {
                out.push(None);
            }
            out.push(Some(num));
            last = num;
        }
    }
    out.into_iter()
}

/// A page of one array-valued document field, loaded through a
/// `$slice`-style projection.
///
/// Created by [`paginate_field`]; adjacent pages re-project through the
/// retained loader instead of re-slicing in memory.
pub struct FieldPagination<'a> {
    // Not derivable: the loader is a trait object without a `Debug` bound.
    loader: &'a dyn DocumentLoader,
    collection: String,
    doc_id: Bson,
    field: String,
    /// The array elements on this page.
    pub items: Vec<Bson>,
    /// The current page number (1-indexed).
    pub page: usize,
    /// Number of elements per page.
    pub per_page: usize,
    /// Total length of the array field.
    pub total: usize,
}

impl std::fmt::Debug for FieldPagination<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldPagination")
            .field("collection", &self.collection)
            .field("doc_id", &self.doc_id)
            .field("field", &self.field)
            .field("items", &self.items)
            .field("page", &self.page)
            .field("per_page", &self.per_page)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

/// Paginates the array field `field` of the document identified by `doc_id`.
///
/// Only the requested sub-range is loaded, via
/// [`DocumentLoader::load_field_slice`]. When `total` is not supplied it
/// falls back to a `<field>_count` value on the projected document, then to
/// the length of the loaded slice.
///
/// # Errors
///
/// Range errors as in [`paginate`]; loader failures propagate.
pub fn paginate_field<'a>(
    loader: &'a dyn DocumentLoader,
    collection: &str,
    doc_id: &Bson,
    field: &str,
    page: usize,
    per_page: usize,
    total: Option<usize>,
) -> DocJsonResult<FieldPagination<'a>> {
    if page < 1 {
        return Err(DocJsonError::InvalidPage(page));
    }
    let start = (page - 1) * per_page;
    let projected = loader.load_field_slice(collection, doc_id, field, start, per_page)?;

    let items: Vec<Bson> = match projected.get(field) {
        Some(Bson::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    if items.is_empty() && page != 1 {
        return Err(DocJsonError::PageOutOfRange(page));
    }

    let counter = format!("{field}_count");
    let total = total
        .or_else(|| counted(&projected, &counter))
        .unwrap_or(items.len());

    Ok(FieldPagination {
        loader,
        collection: collection.to_string(),
        doc_id: doc_id.clone(),
        field: field.to_string(),
        items,
        page,
        per_page,
        total,
    })
}

fn counted(doc: &BsonDocument, key: &str) -> Option<usize> {
    match doc.get(key) {
        Some(Bson::Int32(n)) => usize::try_from(*n).ok(),
        Some(Bson::Int64(n)) => usize::try_from(*n).ok(),
        _ => None,
    }
}

impl<'a> FieldPagination<'a> {
    /// Total number of pages.
    pub fn pages(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }

    /// Whether a previous page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// The previous page number, if any.
    pub fn prev_num(&self) -> Option<usize> {
        self.has_prev().then(|| self.page - 1)
    }

    /// Whether a further page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    /// The next page number, if any.
    pub fn next_num(&self) -> Option<usize> {
        self.has_next().then(|| self.page + 1)
    }

    /// Iterates page numbers for a pager widget; see
    /// [`Pagination::iter_pages`].
    pub fn iter_pages(
        &self,
        left_edge: usize,
        left_current: usize,
        right_current: usize,
        right_edge: usize,
    ) -> impl Iterator<Item = Option<usize>> + '_ {
        page_window(
            self.page,
            self.pages(),
            left_edge,
            left_current,
            right_current,
            right_edge,
        )
    }

    /// [`iter_pages`](FieldPagination::iter_pages) with the default edge and
    /// window sizes (2, 2, 3, 2).
    pub fn iter_pages_default(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.iter_pages(2, 2, 3, 2)
    }

    /// Loads the previous page through the same projection.
    pub fn prev(&self) -> DocJsonResult<FieldPagination<'a>> {
        if !self.has_prev() {
            return Err(DocJsonError::PageOutOfRange(0));
        }
        paginate_field(
            self.loader,
            &self.collection,
            &self.doc_id,
            &self.field,
            self.page - 1,
            self.per_page,
            Some(self.total),
        )
    }

    /// Loads the next page through the same projection.
    pub fn next(&self) -> DocJsonResult<FieldPagination<'a>> {
        paginate_field(
            self.loader,
            &self.collection,
            &self.doc_id,
            &self.field,
            self.page + 1,
            self.per_page,
            Some(self.total),
        )
    }
}
