//! Analysis pipelines built on top of [`Sequence`](crate::data_structs::Sequence)
//! tracks: CNV segmentation ([`calling`]) and cohort noise removal
//! ([`filter`]).

pub mod calling;
pub mod filter;
