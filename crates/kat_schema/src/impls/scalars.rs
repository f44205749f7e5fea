use alloc::string::String;

use crate::codec::ScalarCodec;
use crate::info::{NonGenericTypeInfoCell, TypeInfo, TypeKind, Typed};

macro_rules! impl_scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    TypeInfo::new::<Self>($name, TypeKind::Scalar).with_synthesize(ScalarCodec::<Self>::synthesize)
                })
            }
        }
    )*};
}

impl_scalar! {
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    char => "char",
    String => "String",
    () => "()",
}
