pub mod cart_repo;
mod checkout;
pub mod coupon_repo;
mod inventory;
pub mod models;
pub mod order_repo;
pub mod payment_repo;
pub mod vnpay;

#[cfg(test)]
pub(crate) mod test_support;
