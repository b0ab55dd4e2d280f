pub mod jokes;
pub mod votes;
