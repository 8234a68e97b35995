use municipal_portal::{
    AppConfig,
    config::{Env, LOCAL_JWT_SECRET},
    route_table,
};
use serial_test::serial;
use std::{env, panic, time::Duration};

const CONFIG_VARS: [&str; 5] = [
    "APP_ENV",
    "PORTAL_JWT_SECRET",
    "PORTAL_BIND_ADDR",
    "LOGIN_DELAY_MS",
    "SESSION_TTL_SECS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with a clean slate for every portal variable, restoring the originals after.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            // PORTAL_JWT_SECRET is missing.
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic on a missing signing secret"
    );
}

#[test]
#[serial]
fn test_app_config_production_with_secret() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("PORTAL_JWT_SECRET", "prod-secret");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.jwt_secret, "prod-secret");
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, LOCAL_JWT_SECRET);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.login_delay, Duration::from_millis(1500));
    assert_eq!(config.session_ttl, Duration::from_secs(28_800));
}

#[test]
#[serial]
fn test_app_config_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("PORTAL_BIND_ADDR", "127.0.0.1:8080");
            env::set_var("LOGIN_DELAY_MS", "0");
            env::set_var("SESSION_TTL_SECS", "60");
        }
        AppConfig::load()
    });

    // An unset APP_ENV means local.
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert!(config.login_delay.is_zero());
    assert_eq!(config.session_ttl, Duration::from_secs(60));
}

#[test]
#[serial]
fn test_malformed_numbers_fall_back_to_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("LOGIN_DELAY_MS", "soon");
        }
        AppConfig::load()
    });

    assert_eq!(config.login_delay, Duration::from_millis(1500));
}

#[test]
fn test_shipped_route_tables_are_valid() {
    assert_eq!(route_table::validate_all(), Ok(()));
}
