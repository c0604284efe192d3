pub mod inspect;
pub mod optimize;
