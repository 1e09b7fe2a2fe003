//! Macros for reducing boilerplate when defining entities
//!
//! Every persisted type carries `id`, `created_at` and `updated_at` fields;
//! [`impl_entity!`](crate::impl_entity) generates the matching
//! [`Entity`](crate::core::Entity) implementation.

/// Implement the `Entity` trait for a struct with the standard base fields
///
/// # Example
///
/// ```rust,ignore
/// pub struct Menu {
///     id: Uuid,
///     created_at: DateTime<Utc>,
///     updated_at: DateTime<Utc>,
///     // ...
/// }
///
/// impl_entity!(Menu, "menu", "menus");
/// ```
///
/// A `String` field holding a business key that stores must keep unique is
/// named with `unique = field`:
///
/// ```rust,ignore
/// impl_entity!(Order, "order", "orders", unique = order_number);
/// ```
#[macro_export]
macro_rules! impl_entity {
    (@impl $type:ident, $singular:expr, $plural:expr, { $($extra:tt)* }) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            $($extra)*
        }
    };
    ($type:ident, $singular:expr, $plural:expr) => {
        $crate::impl_entity!(@impl $type, $singular, $plural, {});
    };
    ($type:ident, $singular:expr, $plural:expr, unique = $field:ident) => {
        $crate::impl_entity!(@impl $type, $singular, $plural, {
            fn unique_key(&self) -> ::std::option::Option<&str> {
                ::std::option::Option::Some(&*self.$field)
            }
        });
    };
}
