use std::collections::VecDeque;

use futures_util::stream::{self, Stream};

use crate::error::ConnectorError;

/// Where the next page comes from. `Token` covers `nextPageToken`/cursor
/// style APIs; `Offset` covers page-number/offset style ones; `Done`
/// ends the stream.
#[derive(Debug, Clone)]
pub enum PageToken {
    Start,
    Token(String),
    Offset(u64),
    Done,
}

/// Drains a token- or page-based paginated API into a single flat
/// stream of items, fetching the next page only once the current one
/// is exhausted. `fetch_page` returns the page's items plus the token
/// for the next page (`PageToken::Done` to stop).
pub fn paginate<T, F, Fut>(fetch_page: F) -> impl Stream<Item = Result<T, ConnectorError>>
where
    T: Send + 'static,
    F: FnMut(PageToken) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(Vec<T>, PageToken), ConnectorError>> + Send,
{
    struct State<T, F> {
        token: PageToken,
        buffer: VecDeque<T>,
        fetch_page: F,
        done: bool,
    }

    let initial = State {
        token: PageToken::Start,
        buffer: VecDeque::new(),
        fetch_page,
        done: false,
    };

    stream::unfold(initial, |mut state| async move {
        loop {
            if let Some(item) = state.buffer.pop_front() {
                return Some((Ok(item), state));
            }
            if state.done {
                return None;
            }
            match (state.fetch_page)(state.token.clone()).await {
                Ok((items, next_token)) => {
                    state.done = matches!(next_token, PageToken::Done);
                    state.token = next_token;
                    state.buffer = items.into();
                    if state.buffer.is_empty() && state.done {
                        return None;
                    }
                }
                Err(err) => {
                    state.done = true;
                    return Some((Err(err), state));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn drains_all_pages_in_order() {
        let stream = paginate(|token| async move {
            match token {
                PageToken::Start => Ok((vec![1, 2], PageToken::Offset(1))),
                PageToken::Offset(1) => Ok((vec![3, 4], PageToken::Offset(2))),
                PageToken::Offset(2) => Ok((vec![5], PageToken::Done)),
                _ => Ok((vec![], PageToken::Done)),
            }
        });

        let items: Vec<i32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn stops_on_first_error() {
        let stream = paginate(|token| async move {
            match token {
                PageToken::Start => Ok((vec![1], PageToken::Offset(1))),
                _ => Err(ConnectorError::Transient("boom".into())),
            }
        });

        let items: Vec<Result<i32, ConnectorError>> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn empty_pages_are_skipped_without_ending_early() {
        let stream = paginate(|token| async move {
            match token {
                PageToken::Start => Ok((vec![], PageToken::Offset(1))),
                PageToken::Offset(1) => Ok((vec![9], PageToken::Done)),
                _ => Ok((vec![], PageToken::Done)),
            }
        });

        let items: Vec<i32> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(items, vec![9]);
    }
}
