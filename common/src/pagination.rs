//! Abstractions for page-number pagination.

use std::num::NonZeroUsize;

/// Requested page number, starting from `1`.
///
/// Any input is accepted: unparsable values point to the first page, and
/// out-of-range values are clamped once the total number of items is known
/// (see [`Arguments::resolve()`]).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Number(NonZeroUsize);

impl Number {
    /// The first page.
    pub const FIRST: Self = Self(NonZeroUsize::MIN);

    /// Creates a new [`Number`], clamping non-positive values to the
    /// [first](Self::FIRST) page.
    #[must_use]
    pub fn new(num: i64) -> Self {
        usize::try_from(num)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Self::FIRST, Self)
    }

    /// Parses a [`Number`] out of a raw request parameter.
    ///
    /// Missing or non-numeric input yields the [first](Self::FIRST) page.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<i64>().ok())
            .map_or(Self::FIRST, Self::new)
    }

    /// Returns this [`Number`] as a [`usize`].
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Pagination arguments: which page of which size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// Requested page [`Number`].
    pub page: Number,

    /// Maximum number of items on a page.
    pub per_page: NonZeroUsize,
}

impl Arguments {
    /// Creates new [`Arguments`] for the requested `page` of `per_page`
    /// items.
    #[must_use]
    pub const fn new(page: Number, per_page: NonZeroUsize) -> Self {
        Self { page, per_page }
    }

    /// Resolves these [`Arguments`] against the `total` number of items,
    /// clamping the requested page into the valid range.
    ///
    /// An empty collection still has one (empty) page.
    #[must_use]
    pub fn resolve(&self, total: usize) -> Window {
        let per_page = self.per_page.get();
        let pages = total.div_ceil(per_page).max(1);
        let number = self.page.get().min(pages);
        Window {
            number,
            pages,
            offset: (number - 1) * per_page,
            limit: per_page,
            total,
        }
    }
}

/// Concrete slice of a collection selected by resolved [`Arguments`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    /// Number of the selected page (always within `1..=pages`).
    pub number: usize,

    /// Total number of pages.
    pub pages: usize,

    /// Number of items to skip.
    pub offset: usize,

    /// Maximum number of items to take.
    pub limit: usize,

    /// Total number of items in the collection.
    pub total: usize,
}

/// A single page of items.
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// Items of this [`Page`].
    pub items: Vec<T>,

    /// [`Window`] this [`Page`] was selected with.
    pub window: Window,
}

impl<T> Page<T> {
    /// Creates a new [`Page`] out of the provided items and [`Window`].
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = T>, window: Window) -> Self {
        Self {
            items: items.into_iter().collect(),
            window,
        }
    }

    /// Slices the `whole` already filtered and ordered collection according
    /// to the provided [`Arguments`].
    #[must_use]
    pub fn slice(whole: Vec<T>, args: &Arguments) -> Self {
        let window = args.resolve(whole.len());
        Self::new(
            whole.into_iter().skip(window.offset).take(window.limit),
            window,
        )
    }

    /// Indicates whether a page precedes this one.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.window.number > 1
    }

    /// Indicates whether a page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.window.number < self.window.pages
    }

    /// Maps the items of this [`Page`] keeping its [`Window`].
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
        }
    }
}

/// Defines pagination types for a list of `$node`s filtered by `$filter`.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        #[derive(Clone, Debug)]
        pub struct Selector {
            #[doc = "Pagination [`Arguments`]."]
            pub arguments: Arguments,

            #[doc = "Filter being applied before paginating."]
            pub filter: $filter,
        }
    };
}

#[cfg(test)]
mod spec {
    use std::num::NonZeroUsize;

    use super::{Arguments, Number, Page};

    fn args(page: i64) -> Arguments {
        Arguments::new(Number::new(page), NonZeroUsize::new(9).unwrap())
    }

    #[test]
    fn parses_page_number_leniently() {
        assert_eq!(Number::parse(None), Number::FIRST);
        assert_eq!(Number::parse(Some("abc")), Number::FIRST);
        assert_eq!(Number::parse(Some("-3")), Number::FIRST);
        assert_eq!(Number::parse(Some("0")), Number::FIRST);
        assert_eq!(Number::parse(Some(" 4 ")).get(), 4);
    }

    #[test]
    fn clamps_out_of_range_pages() {
        let w = args(100).resolve(20);
        assert_eq!(w.pages, 3);
        assert_eq!(w.number, 3);
        assert_eq!(w.offset, 18);

        let w = args(0).resolve(20);
        assert_eq!(w.number, 1);
        assert_eq!(w.offset, 0);
    }

    #[test]
    fn empty_collection_has_single_page() {
        let w = args(5).resolve(0);
        assert_eq!((w.number, w.pages, w.offset), (1, 1, 0));
    }

    #[test]
    fn pages_concatenate_to_whole() {
        let whole = (0..25).collect::<Vec<_>>();

        let mut collected = vec![];
        for n in 1..=3 {
            let page = Page::slice(whole.clone(), &args(n));
            assert!(page.items.len() <= 9);
            collected.extend(page.items);
        }

        assert_eq!(collected, whole);
    }

    #[test]
    fn reports_neighbours() {
        let whole = (0..10).collect::<Vec<_>>();

        let first = Page::slice(whole.clone(), &args(1));
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = Page::slice(whole, &args(2));
        assert!(last.has_previous());
        assert!(!last.has_next());
        assert_eq!(last.items, vec![9]);
    }
}
