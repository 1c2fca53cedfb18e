use std::time::Duration;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::entity::users::{self, Entity as Users};

const TAG: &str = "pbkdf2";
const ITERATIONS: u32 = 100_000;
const SALT_BYTES: usize = 16;
const KEY_BYTES: usize = 64;

/// Produce a tagged digest record: `pbkdf2$<iterations>$<salt>$<hash>`,
/// salt and hash hex-encoded. The hex text of the salt is itself the KDF
/// salt input, so records verify against rows written by earlier releases.
pub fn hash_password(plain: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let mut key = [0u8; KEY_BYTES];
    pbkdf2_hmac::<Sha512>(plain.as_bytes(), salt_hex.as_bytes(), ITERATIONS, &mut key);
    format!("{TAG}${ITERATIONS}${salt_hex}${}", hex::encode(key))
}

/// Verify against either form. Untagged records are legacy plaintext rows
/// awaiting the migration sweep and compare directly; tagged records are
/// re-derived with the embedded parameters and compared constant-time.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    if !stored.starts_with("pbkdf2$") {
        return plain == stored;
    }

    let mut parts = stored.split('$');
    let _tag = parts.next();
    let iterations = match parts.next().and_then(|s| s.parse::<u32>().ok()) {
        Some(n) if n > 0 => n,
        _ => return false,
    };
    let salt_hex = match parts.next() {
        Some(s) => s,
        None => return false,
    };
    let expected = match parts.next().map(hex::decode) {
        Some(Ok(bytes)) if bytes.len() == KEY_BYTES => bytes,
        _ => return false,
    };

    let mut key = [0u8; KEY_BYTES];
    pbkdf2_hmac::<Sha512>(plain.as_bytes(), salt_hex.as_bytes(), iterations, &mut key);
    expected.ct_eq(&key).into()
}

/// Rewrite every untagged password as a tagged record. Each row is read
/// and updated independently, so a login racing the sweep authenticates
/// against whichever form is currently stored.
pub async fn migrate_plaintext_passwords(db: &DatabaseConnection) {
    let rows: Vec<(i64, String)> = match Users::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Password)
        .into_tuple()
        .all(db)
        .await
    {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(error = %err, "password migration scan failed");
            return;
        }
    };

    for (id, password) in rows {
        if password.is_empty() || password.starts_with("pbkdf2$") {
            continue;
        }
        let active = users::ActiveModel {
            id: Set(id),
            password: Set(hash_password(&password)),
            ..Default::default()
        };
        if let Err(err) = active.update(db).await {
            tracing::warn!(error = %err, user_id = id, "password migration skipped row");
        }
    }
}

/// Run the migration sweep once, detached from any request, shortly after
/// startup.
pub fn spawn_migration_sweep(db: DatabaseConnection) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        migrate_plaintext_passwords(&db).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let record = hash_password("pw1");
        assert!(record.starts_with("pbkdf2$100000$"));
        assert!(verify_password("pw1", &record));
        assert!(!verify_password("pw2", &record));
    }

    #[test]
    fn distinct_plaintexts_never_cross_verify() {
        let record = hash_password("alpha");
        let other = hash_password("beta");
        assert!(!verify_password("alpha", &other));
        assert!(!verify_password("beta", &record));
    }

    #[test]
    fn legacy_plaintext_falls_back_to_equality() {
        assert!(verify_password("secret", "secret"));
        assert!(!verify_password("secret", "other"));
    }

    #[test]
    fn malformed_tagged_records_verify_false() {
        assert!(!verify_password("pw", "pbkdf2$"));
        assert!(!verify_password("pw", "pbkdf2$abc$00$00"));
        assert!(!verify_password("pw", "pbkdf2$100000$00"));
        assert!(!verify_password("pw", "pbkdf2$100000$00$zz"));
    }

    #[test]
    fn salts_are_random_per_record() {
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }
}
