use crate::component::ComponentInfo;
use crate::query::Filter;

macro_rules! impl_query_data {
    ($($d:ident),*) => {
        impl_query_data!([] [$($d)*]);
    };

    ([$($d:ident)*] []) => {
        unsafe impl<$($d),*> crate::query::QueryData for ($($d,)*)
        where
            $($d: crate::query::QueryData),*
        {
            type Buffer = ($($d::Buffer,)*);
            type Item<'q> = ($($d::Item<'q>,)*);

            #[allow(unused)]
            fn terms(terms: &mut Vec<crate::query::FetchTerm>) {
                $($d::terms(terms);)*
            }

            #[allow(unused)]
            fn access(access: &mut crate::access::WorldAccess) {
                $($d::access(access);)*
            }

            #[allow(unused, non_snake_case)]
            unsafe fn fetch(
                archetype: &crate::archetype::Archetype,
                ids: &mut ::std::slice::Iter<
                    '_,
                    Option<crate::component::ComponentId>,
                >,
                buffer: &mut Self::Buffer,
            ) {
                let ($($d,)*) = buffer;

                $(unsafe { $d::fetch(archetype, ids, $d) };)*
            }

            #[allow(unused, non_snake_case, clippy::unused_unit)]
            unsafe fn item<'q>(
                buffer: &'q Self::Buffer,
                index: usize,
            ) -> Self::Item<'q> {
                let ($($d,)*) = buffer;

                ($(unsafe { $d::item($d, index) },)*)
            }

            #[allow(unused, non_snake_case)]
            fn clear(buffer: &mut Self::Buffer) {
                let ($($d,)*) = buffer;

                $($d::clear($d);)*
            }
        }

        unsafe impl<$($d),*> crate::query::ReadOnlyQueryData for ($($d,)*)
        where
            $($d: crate::query::ReadOnlyQueryData),*
        {
        }
    };

    ([$($rest:ident)*] [$head:ident $($tail:ident)*]) => {
        impl_query_data!([$($rest)*] []);
        impl_query_data!([$($rest)* $head] [$($tail)*]);
    };
}

macro_rules! impl_query_filter {
    ($($f:ident),*) => {
        impl_query_filter!([] [$($f)*]);
    };

    ([$($f:ident)*] []) => {
        impl<$($f),*> crate::query::QueryFilter for ($($f,)*)
        where
            $($f: crate::query::QueryFilter),*
        {
            fn filter() -> Filter<ComponentInfo> {
                Filter::And(vec![$($f::filter()),*])
            }
        }
    };

    ([$($rest:ident)*] [$head:ident $($tail:ident)*]) => {
        impl_query_filter!([$($rest)*] []);
        impl_query_filter!([$($rest)* $head] [$($tail)*]);
    };
}

impl_query_data!(D0, D1, D2, D3, D4, D5, D6, D7);

impl_query_filter!(F0, F1, F2, F3, F4, F5, F6, F7);
