//! # Descriptor Macros

/// Implements [`Describe`](crate::Describe) for a model struct.
///
/// The field list repeats the struct's fields (name, visibility, type) in
/// declaration order. A field may carry a raw tag with `#[tag = "..."]`.
/// The descriptor is built on first use and cached for the life of the
/// process.
///
/// Field types must name the model explicitly; `Self` is not available
/// inside the generated descriptor function.
///
/// ## Example
/// ```rust
/// use ezrepo_core::{auto_preloads, describe_record};
///
/// pub struct Author {
///     pub username: String,
///     pub posts: Vec<Post>,
///     pub drafts: Vec<Post>,
/// }
///
/// pub struct Post {
///     pub title: String,
/// }
///
/// describe_record! {
///     Author {
///         pub username: String,
///         pub posts: Vec<Post>,
///         #[tag = r#"ezg:"no-preload""#]
///         pub drafts: Vec<Post>,
///     }
/// }
///
/// describe_record! {
///     Post {
///         pub title: String,
///     }
/// }
///
/// assert_eq!(auto_preloads::<Author>(), vec!["posts"]);
/// ```
#[macro_export]
macro_rules! describe_record {
    (
        $model:ident {
            $(
                $(#[tag = $tag:literal])?
                $vis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        impl $crate::Describe for $model {
            fn type_desc() -> $crate::TypeDesc {
                fn record() -> &'static $crate::RecordDesc {
                    static DESC: ::std::sync::OnceLock<$crate::RecordDesc> =
                        ::std::sync::OnceLock::new();
                    DESC.get_or_init(|| {
                        $crate::RecordDesc::new(stringify!($model))
                            $(
                                .with_field(
                                    $crate::FieldDesc::new(
                                        stringify!($field),
                                        $crate::Visibility::from_token(stringify!($vis)),
                                        <$fty as $crate::Describe>::type_desc(),
                                    )
                                    $(.with_tag($tag))?
                                )
                            )*
                    })
                }
                $crate::TypeDesc::Record($crate::RecordRef::new(record))
            }
        }
    };
}
