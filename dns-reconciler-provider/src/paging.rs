//! Lazy, cursor-following sequences over page-at-a-time listings.
//!
//! Every backend lists in pages. [`PagedSequence`] turns a page fetcher into one
//! continuous [`Stream`], fetching the next page only when the caller advances
//! past the last buffered element of the current one. Nothing is prefetched.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::error::Result;
use crate::types::{Page, PagePointer};

/// Where a sequence stands between polls.
enum Cursor<T> {
    /// Nothing fetched yet.
    Start,
    /// Draining a page; `next` is that page's continuation.
    Buffered {
        items: VecDeque<T>,
        next: Option<PagePointer>,
    },
    /// Exhausted, or a fetch failed.
    Done,
}

impl<T> Cursor<T> {
    fn from_page(page: Page<T>) -> Self {
        Self::Buffered {
            items: page.items.into(),
            next: page.next,
        }
    }
}

/// A lazy, forward-only sequence over a paginated listing.
///
/// Each listing call builds a fresh sequence; sequences never share cursor
/// state. A fetch error is yielded once and ends the sequence.
///
/// # Examples
///
/// ```rust
/// use dns_reconciler_provider::{Page, PagePointer, PagedSequence, ProviderError};
/// use futures::FutureExt;
///
/// # futures::executor::block_on(async {
/// let seq = PagedSequence::new(|cursor: Option<PagePointer>| {
///     async move {
///         Ok::<_, ProviderError>(match cursor.as_ref().and_then(PagePointer::as_token) {
///             None => Page::new(vec![1, 2], Some(PagePointer::token("2"))),
///             Some(_) => Page::last(vec![3]),
///         })
///     }
///     .boxed()
/// });
/// assert_eq!(seq.collect_all().await.unwrap(), vec![1, 2, 3]);
/// # });
/// ```
pub struct PagedSequence<'a, T> {
    inner: BoxStream<'a, Result<T>>,
}

impl<'a, T: Send + 'a> PagedSequence<'a, T> {
    /// Sequence whose first page is fetched on the first poll.
    pub fn new<F>(fetch: F) -> Self
    where
        F: FnMut(Option<PagePointer>) -> BoxFuture<'a, Result<Page<T>>> + Send + 'a,
    {
        Self::from_cursor(Cursor::Start, fetch)
    }

    /// Sequence over an already-fetched first page.
    pub fn from_first_page<F>(first: Page<T>, fetch: F) -> Self
    where
        F: FnMut(Option<PagePointer>) -> BoxFuture<'a, Result<Page<T>>> + Send + 'a,
    {
        Self::from_cursor(Cursor::from_page(first), fetch)
    }

    /// Sequence over a fixed list, without any fetching.
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            inner: stream::iter(items.into_iter().map(Ok)).boxed(),
        }
    }

    /// Sequence that yields nothing.
    pub fn empty() -> Self {
        Self::from_items(Vec::new())
    }

    fn from_cursor<F>(cursor: Cursor<T>, fetch: F) -> Self
    where
        F: FnMut(Option<PagePointer>) -> BoxFuture<'a, Result<Page<T>>> + Send + 'a,
    {
        let inner = stream::unfold((cursor, fetch), |(mut cursor, mut fetch)| async move {
            loop {
                match cursor {
                    Cursor::Done => return None,
                    Cursor::Start => match fetch(None).await {
                        Ok(page) => cursor = Cursor::from_page(page),
                        Err(e) => return Some((Err(e), (Cursor::Done, fetch))),
                    },
                    Cursor::Buffered { mut items, next } => {
                        if let Some(item) = items.pop_front() {
                            return Some((Ok(item), (Cursor::Buffered { items, next }, fetch)));
                        }
                        let Some(pointer) = next else {
                            return None;
                        };
                        match fetch(Some(pointer)).await {
                            Ok(page) => cursor = Cursor::from_page(page),
                            Err(e) => return Some((Err(e), (Cursor::Done, fetch))),
                        }
                    }
                }
            }
        })
        .boxed();

        Self { inner }
    }

    /// Skip elements failing `predicate`.
    ///
    /// Skipped elements still drive page advancement, so filtering never ends
    /// the sequence early. Errors always pass through.
    #[must_use]
    pub fn filter<P>(self, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + Send + 'a,
    {
        let inner = self
            .inner
            .filter(move |item| {
                future::ready(match item {
                    Ok(value) => predicate(value),
                    Err(_) => true,
                })
            })
            .boxed();
        Self { inner }
    }

    /// Transform each element.
    pub fn map<U, M>(self, f: M) -> PagedSequence<'a, U>
    where
        U: Send + 'a,
        M: FnMut(T) -> U + Send + 'a,
    {
        PagedSequence {
            inner: self.inner.map_ok(f).boxed(),
        }
    }

    /// Drain the whole sequence, stopping at the first error.
    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.inner.try_collect().await
    }
}

impl<T> Stream for PagedSequence<'_, T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;
    use crate::error::ProviderError;

    /// Pages of the given sizes, numbering elements from 1; counts fetches.
    fn numbered_pages(
        sizes: &'static [usize],
        fetches: Arc<AtomicUsize>,
    ) -> PagedSequence<'static, usize> {
        PagedSequence::new(move |cursor: Option<PagePointer>| {
            let fetches = fetches.clone();
            async move {
                fetches.fetch_add(1, Ordering::SeqCst);
                let index = cursor
                    .as_ref()
                    .and_then(PagePointer::as_token)
                    .map_or(0, |token| token.parse::<usize>().unwrap());
                let start: usize = sizes[..index].iter().sum();
                let items = (start + 1..=start + sizes[index]).collect();
                let next = (index + 1 < sizes.len()).then(|| PagePointer::token((index + 1).to_string()));
                Ok::<_, ProviderError>(Page::new(items, next))
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn yields_all_pages_in_order() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let seq = numbered_pages(&[2, 2, 1], fetches.clone());

        assert_eq!(seq.collect_all().await.unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fetches_next_page_only_after_current_is_drained() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut seq = numbered_pages(&[2, 2, 1], fetches.clone());
        assert_eq!(fetches.load(Ordering::SeqCst), 0, "construction must not fetch");

        let expected_fetches = [1, 1, 2, 2, 3];
        for (i, expected) in expected_fetches.iter().enumerate() {
            let item = seq.next().await.unwrap().unwrap();
            assert_eq!(item, i + 1);
            assert_eq!(fetches.load(Ordering::SeqCst), *expected, "after element {item}");
        }
        assert!(seq.next().await.is_none());
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_intermediate_pages_keep_advancing() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let seq = numbered_pages(&[1, 0, 0, 2], fetches.clone());

        assert_eq!(seq.collect_all().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn filter_does_not_stop_pagination() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let seq = numbered_pages(&[2, 2, 1], fetches.clone()).filter(|n| *n == 5);

        assert_eq!(seq.collect_all().await.unwrap(), vec![5]);
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_page_supplied_up_front() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let first = Page::new(vec!["a"], Some(PagePointer::token("1")));
        let seq = PagedSequence::from_first_page(first, move |_cursor| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Page::last(vec!["b"])) }.boxed()
        });

        assert_eq!(seq.collect_all().await.unwrap(), vec!["a", "b"]);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_error_is_yielded_once_then_ends() {
        let mut seq: PagedSequence<'_, u8> =
            PagedSequence::from_first_page(Page::new(vec![1], Some(PagePointer::token("x"))), |_| {
                async {
                    Err(ProviderError::Timeout {
                        provider: "test".into(),
                        detail: "slow".into(),
                    })
                }
                .boxed()
            });

        assert_eq!(seq.next().await.unwrap().unwrap(), 1);
        assert!(matches!(
            seq.next().await,
            Some(Err(ProviderError::Timeout { .. }))
        ));
        assert!(seq.next().await.is_none());
    }

    #[tokio::test]
    async fn independent_sequences_do_not_share_cursors() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut first = numbered_pages(&[1, 1], fetches.clone());
        let second = numbered_pages(&[1, 1], fetches.clone());

        assert_eq!(first.next().await.unwrap().unwrap(), 1);
        assert_eq!(second.collect_all().await.unwrap(), vec![1, 2]);
        assert_eq!(first.next().await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn map_transforms_elements() {
        let seq = PagedSequence::from_items(vec![1, 2]).map(|n| n * 10);
        assert_eq!(seq.collect_all().await.unwrap(), vec![10, 20]);
        assert!(PagedSequence::<u8>::empty().collect_all().await.unwrap().is_empty());
    }
}
