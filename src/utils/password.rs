use bcrypt::{hash, verify};

use crate::error::{AppError, AppResult};

/// bcrypt 密码哈希，盐值嵌入在哈希串中
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        hash(password.as_bytes(), self.cost)
            .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
    }

    pub fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        verify(password.as_bytes(), password_hash)
            .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn hash_then_verify() {
        let hashed = hasher().hash("correct-horse").unwrap();
        assert_ne!(hashed, "correct-horse");
        assert!(hasher().verify("correct-horse", &hashed).unwrap());
        assert!(!hasher().verify("wrong-horse", &hashed).unwrap());
    }

    #[test]
    fn salts_differ_per_hash() {
        let a = hasher().hash("same").unwrap();
        let b = hasher().hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(hasher().verify("anything", "not-a-bcrypt-hash").is_err());
    }
}
