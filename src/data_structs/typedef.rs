pub type PosType = u32;
pub type ValueType = f32;
