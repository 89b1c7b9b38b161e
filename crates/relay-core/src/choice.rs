#![forbid(unsafe_code)]

//! Flat tagged unions produced by [`Channel::either`](crate::Channel::either).
//!
//! `either` always yields a [`Choice2`]. Chaining it nests
//! (`Choice2<Choice2<A, B>, C>`); [`FlattenChoice`] rewrites such nestings into
//! the flat form (`Choice3<A, B, C>`), up to six branches.

macro_rules! define_choice {
    ($(#[$meta:meta])* $name:ident, $arity:literal; $($variant:ident $ty:ident $get:ident $into:ident $idx:literal),+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name<$($ty),+> {
            $($variant($ty),)+
        }

        impl<$($ty),+> $name<$($ty),+> {
            /// Number of branches.
            pub const ARITY: usize = $arity;

            /// One-based index of the active branch.
            #[must_use]
            pub fn index(&self) -> usize {
                match self {
                    $(Self::$variant(_) => $idx,)+
                }
            }

            $(
                #[must_use]
                pub fn $get(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(value) => Some(value),
                        _ => None,
                    }
                }

                #[must_use]
                pub fn $into(self) -> Option<$ty> {
                    match self {
                        Self::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            )+
        }
    };
}

define_choice!(
    /// One of two values.
    Choice2, 2;
    V1 A v1 into_v1 1,
    V2 B v2 into_v2 2
);
define_choice!(
    /// One of three values.
    Choice3, 3;
    V1 A v1 into_v1 1,
    V2 B v2 into_v2 2,
    V3 C v3 into_v3 3
);
define_choice!(
    /// One of four values.
    Choice4, 4;
    V1 A v1 into_v1 1,
    V2 B v2 into_v2 2,
    V3 C v3 into_v3 3,
    V4 D v4 into_v4 4
);
define_choice!(
    /// One of five values.
    Choice5, 5;
    V1 A v1 into_v1 1,
    V2 B v2 into_v2 2,
    V3 C v3 into_v3 3,
    V4 D v4 into_v4 4,
    V5 E v5 into_v5 5
);
define_choice!(
    /// One of six values.
    Choice6, 6;
    V1 A v1 into_v1 1,
    V2 B v2 into_v2 2,
    V3 C v3 into_v3 3,
    V4 D v4 into_v4 4,
    V5 E v5 into_v5 5,
    V6 F v6 into_v6 6
);

/// Collapse one level of left-nested [`Choice2`] into a wider flat union.
pub trait FlattenChoice {
    type Output;

    fn flatten(self) -> Self::Output;
}

macro_rules! impl_flatten {
    ($inner:ident<$($ty:ident),+> + $last:ident => $out:ident; $($variant:ident),+; $tail:ident) => {
        impl<$($ty,)+ $last> FlattenChoice for Choice2<$inner<$($ty),+>, $last> {
            type Output = $out<$($ty,)+ $last>;

            fn flatten(self) -> Self::Output {
                match self {
                    $(Choice2::V1($inner::$variant(value)) => $out::$variant(value),)+
                    Choice2::V2(value) => $out::$tail(value),
                }
            }
        }
    };
}

impl_flatten!(Choice2<A, B> + C => Choice3; V1, V2; V3);
impl_flatten!(Choice3<A, B, C> + D => Choice4; V1, V2, V3; V4);
impl_flatten!(Choice4<A, B, C, D> + E => Choice5; V1, V2, V3, V4; V5);
impl_flatten!(Choice5<A, B, C, D, E> + F => Choice6; V1, V2, V3, V4, V5; V6);
