use axum::Router;

pub const TEST_BOT_TOKEN: &str = "123456:TEST-TOKEN";

pub async fn create_test_app() -> Router {
    std::env::set_var("BOT_TOKEN", TEST_BOT_TOKEN);
    std::env::set_var("DATABASE_URL", "");

    hellenic_backend::create_app().await
}

#[allow(dead_code)]
pub fn bearer_token() -> String {
    hellenic_backend::auth::sign_token(1, 42, TEST_BOT_TOKEN).expect("sign test token")
}
