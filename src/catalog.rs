use reqwest::Method;
use serde_json::json;

use crate::scenario::JsonPathError;
use crate::scenario::Predicate;
use crate::scenario::Scenario;

const EMAIL: &str = "eve.holt@reqres.in";
const REGISTER_PASSWORD: &str = "pistol";
const LOGIN_PASSWORD: &str = "cityslicka";
const MISSING_PASSWORD: &str = "Missing password";

/// Every scenario the suite knows about, in the order they are reported.
pub fn scenarios() -> Result<Vec<Scenario>, JsonPathError> {
    Ok(vec![
        register_with_valid_params(),
        register_with_valid_params_returns_token()?,
        register_without_password_returns_error()?,
        login_with_valid_params(),
        login_with_valid_params_returns_token()?,
        login_without_password_returns_error()?,
        create_user_returns_user_info()?,
        list_unknown_resources()?,
    ])
}

/// Scenarios whose name contains `filter`. `None` selects all of them.
pub fn select(filter: Option<&str>) -> Result<Vec<Scenario>, JsonPathError> {
    let all = scenarios()?;

    Ok(match filter {
        Some(filter) => all
            .into_iter()
            .filter(|s| s.name.contains(filter))
            .collect(),
        None => all,
    })
}

fn register_with_valid_params() -> Scenario {
    Scenario::new("register_with_valid_params", Method::POST, "/api/register")
        .body(json!({ "email": EMAIL, "password": REGISTER_PASSWORD }))
        .status(200)
}

fn register_with_valid_params_returns_token() -> Result<Scenario, JsonPathError> {
    Scenario::new(
        "register_with_valid_params_returns_token",
        Method::POST,
        "/api/register",
    )
    .body(json!({ "email": EMAIL, "password": REGISTER_PASSWORD }))
    .status(200)
    .expect_json("id", Predicate::NotNull)?
    .expect_json("token", Predicate::NotNull)
}

fn register_without_password_returns_error() -> Result<Scenario, JsonPathError> {
    Scenario::new(
        "register_without_password_returns_error",
        Method::POST,
        "/api/register",
    )
    .body(json!({ "email": EMAIL }))
    .status(400)
    .expect_json("error", Predicate::Contains(MISSING_PASSWORD.into()))
}

fn login_with_valid_params() -> Scenario {
    Scenario::new("login_with_valid_params", Method::POST, "/api/login")
        .body(json!({ "email": EMAIL, "password": LOGIN_PASSWORD }))
        .status(200)
}

fn login_with_valid_params_returns_token() -> Result<Scenario, JsonPathError> {
    Scenario::new(
        "login_with_valid_params_returns_token",
        Method::POST,
        "/api/login",
    )
    .body(json!({ "email": EMAIL, "password": LOGIN_PASSWORD }))
    .status(200)
    .expect_json("token", Predicate::NotNull)
}

fn login_without_password_returns_error() -> Result<Scenario, JsonPathError> {
    Scenario::new(
        "login_without_password_returns_error",
        Method::POST,
        "/api/login",
    )
    .body(json!({ "email": EMAIL }))
    .status(400)
    .expect_json("error", Predicate::Contains(MISSING_PASSWORD.into()))
}

fn create_user_returns_user_info() -> Result<Scenario, JsonPathError> {
    let scenario = Scenario::new("create_user_returns_user_info", Method::POST, "/api/users")
        .body(json!({ "name": "jack", "job": "leader" }))
        .status(201);

    // The service echoes the submitted fields back
    let name = scenario.input("name");
    let job = scenario.input("job");

    scenario
        .expect_json("name", Predicate::Equals(name))?
        .expect_json("job", Predicate::Equals(job))?
        .expect_json("id", Predicate::NotNull)?
        .expect_json("createdAt", Predicate::NotNull)
}

fn list_unknown_resources() -> Result<Scenario, JsonPathError> {
    Scenario::new("list_unknown_resources", Method::GET, "/api/unknown")
        .status(200)
        .expect_json("data", Predicate::NonEmptyArray)?
        .expect_json(
            "data[0]",
            Predicate::HasKeys(vec!["id".into(), "name".into()]),
        )
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn catalog_has_eight_uniquely_named_scenarios() {
        let all = scenarios().unwrap();
        assert_eq!(all.len(), 8);

        let mut names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn only_the_listing_has_no_body() {
        for scenario in scenarios().unwrap() {
            if scenario.method == Method::GET {
                assert!(scenario.body.is_none(), "{}", scenario.name);
            } else {
                assert!(scenario.body.is_some(), "{}", scenario.name);
            }
        }
    }

    #[test]
    fn create_user_expects_echoed_input() {
        let scenario = create_user_returns_user_info().unwrap();

        assert_eq!(scenario.expected_status, 201);
        let (path, predicate) = &scenario.expectations[0];
        assert_eq!(path.to_string(), "name");
        assert_eq!(predicate, &Predicate::Equals(json!("jack")));
        let (path, predicate) = &scenario.expectations[1];
        assert_eq!(path.to_string(), "job");
        assert_eq!(predicate, &Predicate::Equals(json!("leader")));
    }

    #[test]
    fn missing_password_scenarios_send_only_email() {
        for scenario in select(Some("without_password")).unwrap() {
            assert_eq!(scenario.body, Some(json!({ "email": EMAIL })));
            assert_eq!(scenario.expected_status, 400);
        }
    }

    #[test]
    fn select_filters_by_name() {
        assert_eq!(select(None).unwrap().len(), 8);
        assert_eq!(select(Some("login")).unwrap().len(), 3);
        assert_eq!(select(Some("register")).unwrap().len(), 3);
        assert_eq!(select(Some("list_unknown")).unwrap().len(), 1);
        assert!(select(Some("delete")).unwrap().is_empty());
    }
}
