use sha1::{Digest, Sha1};

/// Hex SHA1 of the password, the form the service expects in the UsernameToken.
pub fn hash_password(password: &str) -> String {
    let digest = Sha1::digest(password.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_password("password"),
            "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8"
        );
    }

    #[test]
    fn empty_password_still_hashes() {
        assert_eq!(
            hash_password(""),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }
}
