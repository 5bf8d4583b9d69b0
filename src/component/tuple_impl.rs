macro_rules! impl_bundle {
    ($($c:ident),*) => {
        impl_bundle!([] [$($c)*]);
    };

    ([$($c:ident)*] []) => {
        unsafe impl<$($c),*> crate::component::Bundle for ($($c,)*)
        where
            $($c: crate::component::Bundle),*
        {
            #[allow(unused)]
            fn components(list: &mut crate::component::ComponentList) {
                $($c::components(list);)*
            }

            #[allow(unused, non_snake_case)]
            fn write(self, writer: &mut crate::component::ComponentWriter<'_>) {
                let ($($c,)*) = self;

                $(
                    $c.write(writer);
                )*
            }
        }
    };

    ([$($rest:ident)*] [$head:ident $($tail:ident)*]) => {
        impl_bundle!([$($rest)*] []);
        impl_bundle!([$($rest)* $head] [$($tail)*]);
    };
}

macro_rules! impl_component_group {
    ($($c:ident),*) => {
        impl_component_group!([] [$($c)*]);
    };

    ([$($c:ident)*] []) => {
        unsafe impl<$($c),*> crate::component::ComponentGroup for ($($c,)*)
        where
            $($c: crate::component::ComponentGroup),*
        {
            type Mut<'w> = ($($c::Mut<'w>,)*);
            type Ref<'w> = ($($c::Ref<'w>,)*);

            #[allow(unused)]
            fn components(list: &mut crate::component::ComponentList) {
                $($c::components(list);)*
            }

            #[allow(unused, clippy::unused_unit)]
            unsafe fn fetch<'w>(
                archetype: &'w crate::archetype::Archetype,
                ids: &mut ::std::slice::Iter<'_, crate::component::ComponentId>,
                row: usize,
            ) -> Self::Ref<'w> {
                ($(unsafe { $c::fetch(archetype, ids, row) },)*)
            }

            #[allow(unused, clippy::unused_unit)]
            unsafe fn fetch_mut<'w>(
                archetype: &crate::archetype::Archetype,
                ids: &mut ::std::slice::Iter<'_, crate::component::ComponentId>,
                row: usize,
            ) -> Self::Mut<'w> {
                ($(unsafe { $c::fetch_mut(archetype, ids, row) },)*)
            }
        }
    };

    ([$($rest:ident)*] [$head:ident $($tail:ident)*]) => {
        impl_component_group!([$($rest)*] []);
        impl_component_group!([$($rest)* $head] [$($tail)*]);
    };
}

impl_bundle!(
    C0, C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11, C12, C13, C14, C15
);

impl_component_group!(C0, C1, C2, C3, C4, C5, C6, C7);
