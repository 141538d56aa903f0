//! Macros factoring the crate's boilerplate.

/// Generates a zero-cost usize wrapper with its collection aliases.
///
/// Optional trailing items generate a `HashSet` alias (`set`), a `HashMap`
/// alias (`hash map`) and a total-map newtype over `Vec` (`map`).
#[macro_export]
macro_rules! safe_index {
    (
        $(#[$idx_meta:meta])* $idx:ident
        $( $(#[$rest_meta:meta])* $kind:ident: $name:ident )*
    ) => (
        $(#[$idx_meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $idx {
            val: usize,
        }
        impl $idx {
            /// Wrapped value.
            #[inline]
            pub fn get(self) -> usize {
                self.val
            }
            /// Index following this one.
            #[inline]
            pub fn next(self) -> Self {
                $idx { val: self.val + 1 }
            }
        }
        impl From<usize> for $idx {
            fn from(val: usize) -> Self {
                $idx { val }
            }
        }
        impl From<$idx> for usize {
            fn from(idx: $idx) -> usize {
                idx.val
            }
        }
        impl ::std::ops::Deref for $idx {
            type Target = usize;
            fn deref(&self) -> &usize {
                &self.val
            }
        }
        impl ::std::fmt::Display for $idx {
            fn fmt(&self, fmt: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(fmt, "{}", self.val)
            }
        }
        impl ::std::fmt::Debug for $idx {
            fn fmt(&self, fmt: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(fmt, "{}#{}", stringify!($idx), self.val)
            }
        }

        $( safe_index! { @$kind $(#[$rest_meta])* $idx $name } )*
    );

    (@set $(#[$meta:meta])* $idx:ident $name:ident) => (
        $(#[$meta])*
        pub type $name = ::std::collections::HashSet<$idx>;
    );

    (@hmap $(#[$meta:meta])* $idx:ident $name:ident) => (
        $(#[$meta])*
        pub type $name<T> = ::std::collections::HashMap<$idx, T>;
    );

    (@map $(#[$meta:meta])* $idx:ident $name:ident) => (
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name<T> {
            vec: Vec<T>,
        }
        impl<T> $name<T> {
            /// Empty map.
            pub fn new() -> Self {
                $name { vec: vec![] }
            }
            /// Empty map with some capacity.
            pub fn with_capacity(capa: usize) -> Self {
                $name {
                    vec: Vec::with_capacity(capa),
                }
            }
            /// Number of elements.
            pub fn len(&self) -> usize {
                self.vec.len()
            }
            /// True if the map is empty.
            pub fn is_empty(&self) -> bool {
                self.vec.is_empty()
            }
            /// Pushes an element, returns its index.
            pub fn push(&mut self, elem: T) -> $idx {
                let idx = self.vec.len().into();
                self.vec.push(elem);
                idx
            }
            /// Iterator over the elements.
            pub fn iter(&self) -> ::std::slice::Iter<T> {
                self.vec.iter()
            }
            /// Iterator over the (index, element) pairs.
            pub fn index_iter(&self) -> impl Iterator<Item = ($idx, &T)> {
                self.vec
                    .iter()
                    .enumerate()
                    .map(|(idx, elem)| (idx.into(), elem))
            }
            /// Iterator over the indices.
            pub fn indices(&self) -> impl Iterator<Item = $idx> {
                (0..self.vec.len()).map(|idx| idx.into())
            }
        }
        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }
        impl<T> From<Vec<T>> for $name<T> {
            fn from(vec: Vec<T>) -> Self {
                $name { vec }
            }
        }
        impl<T> ::std::ops::Index<$idx> for $name<T> {
            type Output = T;
            fn index(&self, idx: $idx) -> &T {
                &self.vec[idx.get()]
            }
        }
        impl<T> ::std::ops::IndexMut<$idx> for $name<T> {
            fn index_mut(&mut self, idx: $idx) -> &mut T {
                &mut self.vec[idx.get()]
            }
        }
        impl<'a, T> IntoIterator for &'a $name<T> {
            type Item = &'a T;
            type IntoIter = ::std::slice::Iter<'a, T>;
            fn into_iter(self) -> Self::IntoIter {
                self.vec.iter()
            }
        }
    );
}

/// Verbosity-gated logging, solver-output style (`; `-prefixed lines).
///
/// `log! { @1 "..." , args }` prints when `conf.verb >= 1`.
#[macro_export]
macro_rules! log {
    (@$lvl:tt $($stuff:tt)*) => {
        if $crate::common::conf.verb >= $lvl {
            println!("; {}", format!($($stuff)*))
        }
    };
}

/// Bails out with a graph-shape error.
#[macro_export]
macro_rules! shape_bail {
    ($($stuff:tt)*) => {
        return Err(
            $crate::errors::ErrorKind::GraphShape(format!($($stuff)*)).into()
        )
    };
}
