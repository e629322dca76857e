pub mod access;
pub mod admin;
pub mod auth;
pub mod banners;
pub mod calories;
pub mod clock;
pub mod families;
pub mod food_products;
pub mod init;
pub mod pdf;
pub mod pets;
pub mod records;
pub mod share;
pub mod storage;

#[cfg(test)]
pub mod test_support;
