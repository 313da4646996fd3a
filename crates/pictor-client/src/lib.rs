pub mod extract;
pub mod fetcher;

pub use extract::HtmlImageExtractor;
pub use fetcher::ReqwestFetcher;
