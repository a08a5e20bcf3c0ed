/// Converts errors from their error type (of the submodule) to that of
/// a `conflate::Error` variant.
///
/// ```rust,ignore
/// use conflate::matcher::MatchError;
/// conflate::impl_err!(MatchError, Match);
/// ```
pub mod err_macro {
    #[macro_export]
    macro_rules! impl_err {
        ($from:ty, $variant:ident) => {
            impl From<$from> for $crate::Error {
                fn from(value: $from) -> Self {
                    $crate::Error::$variant(value)
                }
            }
        };
    }

    pub use impl_err;
}
