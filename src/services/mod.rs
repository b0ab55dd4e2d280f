pub mod joke_service;
pub mod rating_service;
pub mod vote_service;
