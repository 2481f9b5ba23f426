use super::jwt::{generate_access_token, generate_refresh_token, validate_token};
use super::model::Role;
use uuid::Uuid;

#[test]
fn test_access_token_roundtrip() {
    let id = Uuid::new_v4();
    let token = generate_access_token(id, "warga@desa.id", Role::Warga).unwrap();
    let claims = validate_token(&token).unwrap();

    assert_eq!(claims.sub, id.to_string());
    assert_eq!(claims.email, "warga@desa.id");
    assert_eq!(claims.role, Role::Warga);
    assert_eq!(claims.token_type, "access");
}

#[test]
fn test_refresh_token_type() {
    let token = generate_refresh_token(Uuid::new_v4(), "staf@desa.id", Role::Staf).unwrap();
    let claims = validate_token(&token).unwrap();
    assert_eq!(claims.token_type, "refresh");
    assert_eq!(claims.role, Role::Staf);
}

#[test]
fn test_garbage_token_rejected() {
    assert!(validate_token("not-a-token").is_err());
}

#[test]
fn test_role_capabilities() {
    assert!(!Role::Warga.is_petugas());
    assert!(Role::Staf.is_petugas());
    assert!(Role::KepalaDesa.is_petugas());
}
