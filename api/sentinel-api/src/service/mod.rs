pub mod auth_service;
pub mod notifier_service;
pub mod password_service;
pub mod policy_eval_service;
pub mod seed_service;
pub mod token_service;
pub mod transition_service;
pub mod validation_service;
