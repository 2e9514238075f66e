pub mod jwt;

pub use jwt::JwtService;
