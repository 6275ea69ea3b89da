//! Utility macros for reducing boilerplate

/// Macro to implement `FromRef<AppState>` for state extractors.
///
/// Lets handlers take `State<Resolver>` or `State<RecordService>` directly
/// while the router carries the whole `AppState`.
///
/// # Example
/// ```ignore
/// impl_from_ref!(Resolver, resolver);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for Resolver {
///     fn from_ref(state: &AppState) -> Self {
///         state.resolver.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
