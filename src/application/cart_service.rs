use uuid::Uuid;

use crate::domain::cart::{CartLineView, VariantSelector};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

pub struct CartService<R> {
    repo: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, user_id: Uuid) -> Result<Vec<CartLineView>, DomainError> {
        self.repo.list(user_id)
    }

    pub fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        variant: Option<VariantSelector>,
        quantity: i32,
    ) -> Result<CartLineView, DomainError> {
        let line = self.repo.add(user_id, product_id, variant, quantity)?;
        log::debug!(
            "User {} cart line {} now holds {} x {}",
            user_id,
            line.id,
            line.quantity,
            product_id
        );
        Ok(line)
    }

    pub fn set_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<CartLineView, DomainError> {
        self.repo.set_quantity(user_id, line_id, quantity)
    }

    pub fn remove(&self, user_id: Uuid, line_id: Uuid) -> Result<(), DomainError> {
        self.repo.remove(user_id, line_id)
    }

    pub fn clear(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let removed = self.repo.clear(user_id)?;
        log::debug!("Cleared {} cart lines for user {}", removed, user_id);
        Ok(removed)
    }
}
