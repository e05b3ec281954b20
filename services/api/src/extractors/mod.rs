mod rate_request;

pub use rate_request::RateRequest;
