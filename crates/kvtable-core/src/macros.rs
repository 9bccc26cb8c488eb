// kv_index
/// Declare an [`Index`](crate::db::Index) over one record field.
///
/// `kv_index!(User, id)` names the index after the field and
/// `kv_index!(User, byname => name)` names it explicitly. Index names follow
/// [`Name`](crate::name::Name) rules, so `by_name` is not a valid name.
/// The name is checked in a `const` block, making an invalid one a compile
/// error wherever the macro is used.
/// The field value is cloned to form the key.
#[macro_export]
macro_rules! kv_index {
    ($record:ty, $index:ident => $field:ident) => {
        $crate::db::Index::<$record, _>::new(
            const { $crate::name::Name::new_const(stringify!($index)) },
            |record: &$record| ::core::clone::Clone::clone(&record.$field),
        )
    };
    ($record:ty, $field:ident) => {
        $crate::kv_index!($record, $field => $field)
    };
}

