pub mod discover;
pub mod info;
pub mod inspect;
pub mod invoke;
