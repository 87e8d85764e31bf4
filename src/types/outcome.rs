//! The three shapes a service call can come back in.

/// Result of a call that did not raise.
///
/// When the client does not fail on error, an HTTP 4xx/5xx response yields
/// [`Outcome::Failed`] and the decoded error body is available from
/// [`crate::Client::last_error`] until the next call. `Failed` is distinct from
/// any legitimate falsy value a resource may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The payload was mapped to the requested type.
    Resource(T),
    /// The service answered with a bare string; it is passed through untouched.
    Text(String),
    /// The request failed with an HTTP error that was recorded, not raised.
    Failed,
}

impl<T> Outcome<T> {
    pub fn is_resource(&self) -> bool {
        matches!(self, Outcome::Resource(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed)
    }

    pub fn resource(&self) -> Option<&T> {
        match self {
            Outcome::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn resource_mut(&mut self) -> Option<&mut T> {
        match self {
            Outcome::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Option<T> {
        match self {
            Outcome::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Resource(r) => Outcome::Resource(f(r)),
            Outcome::Text(s) => Outcome::Text(s),
            Outcome::Failed => Outcome::Failed,
        }
    }

    /// Like [`Outcome::map`] for fallible conversions.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Outcome<U>, E> {
        Ok(match self {
            Outcome::Resource(r) => Outcome::Resource(f(r)?),
            Outcome::Text(s) => Outcome::Text(s),
            Outcome::Failed => Outcome::Failed,
        })
    }

    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Resource(r) => Outcome::Resource(r),
            Outcome::Text(s) => Outcome::Text(s.clone()),
            Outcome::Failed => Outcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_sentinels() {
        assert_eq!(Outcome::<i32>::Failed.map(|n| n + 1), Outcome::Failed);
        assert_eq!(
            Outcome::<i32>::Text("busy".into()).map(|n| n + 1),
            Outcome::Text("busy".into())
        );
        assert_eq!(Outcome::Resource(1).map(|n| n + 1), Outcome::Resource(2));
    }

    #[test]
    fn test_try_map_propagates_error() {
        let r: Result<Outcome<i32>, &str> = Outcome::Resource(1).try_map(|_| Err("bad"));
        assert_eq!(r, Err("bad"));
        let r: Result<Outcome<i32>, &str> = Outcome::<i32>::Failed.try_map(|_| Err("bad"));
        assert_eq!(r, Ok(Outcome::Failed));
    }
}
