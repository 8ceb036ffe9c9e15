use std::process::Command;

#[test]
fn fails_without_jwt_secret_when_auth_enabled() {
    let exe = env!("CARGO_BIN_EXE_catering");
    let output = Command::new(exe)
        .env("AUTH_ENABLED", "true")
        .env_remove("JWT_SECRET")
        .output()
        .expect("failed to run catering binary");
    assert!(!output.status.success());
}
