use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

use crate::controllers::{AuthController, HomeController, PremiumController};
use crate::forms::{message_for, LoginForm, SignupForm};
use crate::navigation::{Navigation, Route};
use crate::notice::NoticeKind;
use crate::payment::{PaymentFailure, PaymentFlow, PaymentState};
use crate::store::SessionStore;
use crate::{Client, ClientOptions, ExplorerError, MovieDraft, PlanType, Role, Session, Upload};

fn client_for(server: &MockServer) -> Client {
    Client::new(ClientOptions {
        base_url: server.base_url(),
    })
    .unwrap()
}

fn movie_json(id: u64, title: &str, premium: bool) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "genre": "action",
        "release_year": 1995,
        "rating": 8.3,
        "director": "Michael Mann",
        "duration": 170,
        "description": "A group of professional bank robbers.",
        "premium": premium,
        "main_lead": "Al Pacino",
        "streaming_platform": "Netflix",
        "poster_url": null
    })
}

fn stored_session(store: &SessionStore, role: Role, premium: bool) -> Session {
    let session = Session {
        user_id: 1,
        name: Some("Kim Lee".into()),
        email: "kim@example.com".into(),
        phone: Some("5551234567".into()),
        role,
        auth_token: "tok-1".into(),
        premium_subscribed: premium,
    };
    store.save(&session).unwrap();
    session
}

/// Genre rows are fetched with `?genre=`; registered before the catch-all list mock.
fn mock_empty_genres(server: &MockServer) {
    for genre in crate::controllers::HOME_GENRES {
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/movies")
                .query_param("genre", genre);
            then.status(200).json_body(json!([]));
        });
    }
}

#[test]
fn login_persists_confirmed_premium_flag() {
    let server = MockServer::start();
    let sign_in = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/users/sign_in")
            .json_body(json!({ "user": { "email": "kim@example.com", "password": "password123" } }));
        then.status(200).json_body(json!({
            "id": 1,
            "name": "Kim Lee",
            "email": "kim@example.com",
            "phone": "5551234567",
            "role": "user",
            "token": "tok-1"
        }));
    });
    let status = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/subscriptions/status")
            .header("Authorization", "Bearer tok-1");
        then.status(200).json_body(json!({
            "subscription": { "plan_type": "premium", "expires_at": "2026-11-01T00:00:00Z" }
        }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    let outcome = AuthController::new(&client, &store)
        .login(&LoginForm {
            email: "kim@example.com".into(),
            password: "password123".into(),
        })
        .unwrap();

    sign_in.assert();
    status.assert();

    let notice = outcome.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.title, "Login successful - premium user");
    assert_eq!(outcome.navigation, Some(Navigation::Push(Route::Home)));

    let session = store.load().unwrap().unwrap();
    assert!(session.premium_subscribed);
    assert_eq!(session.auth_token, "tok-1");
    assert_eq!(store.token().unwrap().as_deref(), Some("tok-1"));
}

#[test]
fn rejected_credentials_leave_store_empty() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.path("/api/v1/subscriptions/status");
        then.status(200).json_body(json!({ "plan_type": "premium" }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/users/sign_in");
        then.status(401).json_body(json!({ "error": "Invalid email or password." }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    let outcome = AuthController::new(&client, &store)
        .login(&LoginForm {
            email: "kim@example.com".into(),
            password: "wrong-password".into(),
        })
        .unwrap();

    let notice = outcome.notice.unwrap();
    assert!(notice.is_error());
    assert_eq!(notice.message, "Invalid email or password");
    assert_eq!(outcome.navigation, None);
    assert_eq!(store.load().unwrap(), None);
    status.assert_hits(0);
}

#[test]
fn signup_validation_comes_back_verbatim() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/users");
        then.status(422)
            .json_body(json!({ "errors": ["Mobile number is invalid", "Password is too short"] }));
    });

    let client = client_for(&server);
    let account = SignupForm {
        full_name: "Kim Lee".into(),
        email: "kim@example.com".into(),
        password: "password123".into(),
        phone: "5551234567".into(),
    }
    .to_account();

    match client.signup(&account) {
        Err(ExplorerError::Validation(messages)) => assert_eq!(
            messages,
            vec!["Mobile number is invalid", "Password is too short"]
        ),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn signup_email_conflict_is_attached_to_the_field() {
    let server = MockServer::start();
    let signup = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/users")
            .json_body_partial(r#"{ "user": { "first_name": "Kim", "last_name": "Lee" } }"#);
        then.status(422)
            .json_body(json!({ "errors": { "email": ["has already been taken"] } }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    let errors = AuthController::new(&client, &store)
        .signup(&SignupForm {
            full_name: "Kim Lee".into(),
            email: "kim@example.com".into(),
            password: "password123".into(),
            phone: "5551234567".into(),
        })
        .unwrap_err();

    signup.assert();
    assert_eq!(
        message_for(&errors, "email"),
        Some("Email has already been taken")
    );
}

#[test]
fn deleted_movie_is_gone_after_refetch() {
    let server = MockServer::start();
    mock_empty_genres(&server);
    let delete = server.mock(|when, then| {
        when.method(DELETE)
            .path("/api/v1/movies/7")
            .header("Authorization", "Bearer tok-1");
        then.status(204);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies/7");
        then.status(404).json_body(json!({ "error": "Movie not found" }));
    });
    let catalog = server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies");
        then.status(200)
            .json_body(json!({ "movies": [movie_json(3, "Ronin", false)] }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::Supervisor, false);

    let mut home = HomeController::new(&client, &store);
    home.load();
    let outcome = home.delete_movie(7);

    delete.assert();
    // Initial load plus the refetch after the delete
    catalog.assert_hits(2);
    assert_eq!(outcome.notice.unwrap().title, "Deleted");
    assert!(home.sections().all.iter().all(|movie| movie.id != 7));
    assert_eq!(client.get_movie_by_id(7).unwrap(), None);
}

#[test]
fn members_cannot_delete() {
    let server = MockServer::start();
    mock_empty_genres(&server);
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies");
        then.status(200).json_body(json!([movie_json(7, "Heat", false)]));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/v1/movies/7");
        then.status(204);
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::User, true);

    let mut home = HomeController::new(&client, &store);
    home.load();
    let outcome = home.delete_movie(7);

    assert!(outcome.is_error());
    delete.assert_hits(0);
    assert_eq!(home.sections().all.len(), 1);
}

#[test]
fn empty_search_keeps_home_sections() {
    let server = MockServer::start();
    mock_empty_genres(&server);
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/movies")
            .query_param("title", "zzz");
        then.status(200).json_body(json!({ "movies": [] }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies");
        then.status(200).json_body(json!([
            movie_json(1, "Heat", false),
            movie_json(2, "Ronin", true),
            movie_json(3, "Collateral", false)
        ]));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();

    let mut home = HomeController::new(&client, &store);
    home.load();
    let before = home.sections().clone();

    // A single character never reaches the server
    assert_eq!(home.search("z").notice, None);

    let outcome = home.search("zzz");
    search.assert_hits(1);

    let notice = outcome.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(notice.title, "No results");
    assert_eq!(home.sections(), &before);
    assert_eq!(home.sections().all.len(), 3);
    assert!(home.search_results().unwrap().movies.is_empty());
}

#[test]
fn guests_are_sent_to_login_before_any_fetch() {
    let server = MockServer::start();
    mock_empty_genres(&server);
    let detail = server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies/2");
        then.status(200).json_body(movie_json(2, "Ronin", true));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies");
        then.status(200).json_body(json!([movie_json(2, "Ronin", true)]));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    let mut home = HomeController::new(&client, &store);
    home.load();

    let movie = home.sections().all[0].clone();
    let outcome = home.open_movie(&movie);

    assert_eq!(outcome.navigation, Some(Navigation::Push(Route::Login)));
    detail.assert_hits(0);
}

#[test]
fn create_movie_fails_closed_without_token() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/v1/movies");
        then.status(201).json_body(json!({ "movie": movie_json(9, "Thief", false) }));
    });

    let client = client_for(&server);
    let draft = MovieDraft {
        title: "Thief".into(),
        genre: "action".into(),
        release_year: 1981,
        director: "Michael Mann".into(),
        duration_minutes: 123,
        description: "A safecracker takes one last job.".into(),
        main_lead: "James Caan".into(),
        streaming_platform: "Prime".into(),
        rating: 7.4,
        premium: false,
    };
    let poster = Upload {
        file_name: "thief.jpg".into(),
        mime: "image/jpeg".into(),
        bytes: vec![0xFF, 0xD8, 0xFF],
    };

    assert_eq!(client.create_movie(None, &draft, &poster), None);
    create.assert_hits(0);

    let created = client.create_movie(Some("tok-1"), &draft, &poster).unwrap();
    assert_eq!(created.id, 9);
    create.assert_hits(1);
}

#[test]
fn seven_day_checkout_activates_premium() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/subscriptions")
            .header("Authorization", "Bearer tok-1")
            .json_body(json!({ "plan_type": "7_days" }));
        then.status(200).json_body(json!({
            "url": "https://checkout.stripe.com/c/pay/cs_test_7",
            "session_id": "cs_test_7"
        }));
    });
    let status = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/subscriptions/success")
            .query_param("session_id", "cs_test_7");
        then.status(200).json_body(json!({
            "message": "Subscription updated successfully",
            "subscription": { "plan_type": "premium" }
        }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::User, false);

    let outcome = PremiumController::new(&client, &store).subscribe(PlanType::SevenDays);
    create.assert();

    let intent = match outcome.navigation {
        Some(Navigation::Push(Route::Payment(intent))) => intent,
        other => panic!("expected payment route, got {:?}", other),
    };
    assert_eq!(intent.plan_type, PlanType::SevenDays);
    assert_eq!(store.selected_plan().unwrap(), Some(PlanType::SevenDays));

    let mut flow = PaymentFlow::resume(&client, &store, intent);
    assert_eq!(flow.observe("https://checkout.stripe.com/c/pay/cs_test_7#card"), None);

    let outcome = flow
        .observe("https://movie-explorer.example/success?session_id=cs_test_7")
        .unwrap();

    status.assert();
    assert_eq!(flow.state(), PaymentState::Confirmed);
    assert_eq!(outcome.notice.unwrap().title, "Premium Activated");
    assert_eq!(outcome.navigation, Some(Navigation::Replace(Route::Home)));
    assert!(store.load().unwrap().unwrap().premium_subscribed);

    // The view may report the same URL again; nothing else is sent
    assert_eq!(
        flow.observe("https://movie-explorer.example/success?session_id=cs_test_7"),
        None
    );
    status.assert_hits(1);
}

#[test]
fn failed_verification_leaves_premium_unset() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET).path("/api/v1/subscriptions/success");
        then.status(500).body("<html>Internal Server Error</html>");
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::User, false);

    let intent = crate::SubscriptionIntent {
        plan_type: PlanType::OneMonth,
        checkout_url: "https://checkout.stripe.com/c/pay/cs_test_m".into(),
        session_id: "cs_test_m".into(),
    };
    let mut flow = PaymentFlow::resume(&client, &store, intent);
    let outcome = flow
        .observe("https://movie-explorer.example/success?session_id=cs_test_m")
        .unwrap();

    status.assert();
    assert_eq!(flow.state(), PaymentState::Failed(PaymentFailure::Verification));
    assert_eq!(
        outcome.notice.unwrap().message,
        "An error occurred while verifying your payment."
    );
    assert!(!store.load().unwrap().unwrap().premium_subscribed);
}

#[test]
fn cancelled_checkout_never_queries_status() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.path("/api/v1/subscriptions/success");
        then.status(200).json_body(json!({ "plan_type": "premium" }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::User, false);

    let intent = crate::SubscriptionIntent {
        plan_type: PlanType::OneDay,
        checkout_url: "https://checkout.stripe.com/c/pay/cs_test_d".into(),
        session_id: "cs_test_d".into(),
    };
    let mut flow = PaymentFlow::resume(&client, &store, intent);
    let outcome = flow.observe("https://movie-explorer.example/cancel").unwrap();

    assert_eq!(flow.state(), PaymentState::Cancelled);
    assert_eq!(outcome.notice.unwrap().title, "Payment Cancelled");

    // A late success redirect after cancelling is ignored as well
    assert_eq!(
        flow.observe("https://movie-explorer.example/success?session_id=cs_test_d"),
        None
    );
    status.assert_hits(0);
    assert!(!store.load().unwrap().unwrap().premium_subscribed);
}

#[test]
fn movie_lookup_maps_missing_to_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies/404");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies/5");
        then.status(200).json_body(json!({ "movie": movie_json(5, "Heat", true) }));
    });

    let client = client_for(&server);
    assert_eq!(client.get_movie_by_id(404).unwrap(), None);

    let movie = client.get_movie_by_id(5).unwrap().unwrap();
    assert_eq!(movie.title, "Heat");
    assert_eq!(movie.duration_minutes, 170);
    assert!(movie.premium);
}

fn sample_draft() -> MovieDraft {
    MovieDraft {
        title: "Heat".into(),
        genre: "action".into(),
        release_year: 1995,
        director: "Michael Mann".into(),
        duration_minutes: 170,
        description: "A group of professional bank robbers.".into(),
        main_lead: "Al Pacino".into(),
        streaming_platform: "Netflix".into(),
        rating: 8.3,
        premium: true,
    }
}

#[test]
fn update_movie_sends_multipart_patch_with_optional_banner() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/v1/movies/7")
            .header("Authorization", "Bearer tok-1")
            .header_exists("content-type")
            .body_contains("name=\"movie[title]\"")
            .body_contains("name=\"movie[banner]\"");
        then.status(200).json_body(json!({ "movie": movie_json(7, "Heat", true) }));
    });

    let client = client_for(&server);
    let banner = Upload {
        file_name: "heat-wide.png".into(),
        mime: "image/png".into(),
        bytes: vec![0x89, 0x50, 0x4E, 0x47],
    };

    assert!(!client.update_movie(None, 7, &sample_draft(), None, Some(&banner)));
    update.assert_hits(0);

    assert!(client.update_movie(Some("tok-1"), 7, &sample_draft(), None, Some(&banner)));
    update.assert_hits(1);
}

#[test]
fn update_movie_reports_server_rejection_as_false() {
    let server = MockServer::start();
    let update = server.mock(|when, then| {
        when.method(PATCH).path("/api/v1/movies/7");
        then.status(422).json_body(json!({ "errors": ["Rating must be between 0 and 10"] }));
    });

    let client = client_for(&server);

    assert!(!client.update_movie(Some("tok-1"), 7, &sample_draft(), None, None));
    update.assert();
}

#[test]
fn delete_movie_fails_closed_without_token() {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/v1/movies/7");
        then.status(204);
    });

    let client = client_for(&server);

    assert!(!client.delete_movie(None, 7));
    delete.assert_hits(0);

    assert!(client.delete_movie(Some("tok-1"), 7));
    delete.assert_hits(1);
}

#[test]
fn device_token_requires_auth_token() {
    let server = MockServer::start();
    let register = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/users/update_device_token")
            .header("Authorization", "Bearer tok-1")
            .json_body(json!({ "device_token": "fcm-abc" }));
        then.status(200).json_body(json!({ "message": "Device token updated" }));
    });

    let client = client_for(&server);

    assert!(matches!(
        client.register_device_token("fcm-abc", None),
        Err(ExplorerError::State(_))
    ));
    assert!(matches!(
        client.register_device_token("fcm-abc", Some("")),
        Err(ExplorerError::State(_))
    ));
    register.assert_hits(0);

    client.register_device_token("fcm-abc", Some("tok-1")).unwrap();
    register.assert_hits(1);
}

#[test]
fn device_registration_without_session_shows_error() {
    let server = MockServer::start();
    let register = server.mock(|when, then| {
        when.path("/api/v1/users/update_device_token");
        then.status(200);
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    let outcome = AuthController::new(&client, &store).register_device("fcm-abc");

    assert!(outcome.is_error());
    register.assert_hits(0);

    stored_session(&store, Role::User, false);
    let outcome = AuthController::new(&client, &store).register_device("fcm-abc");
    assert_eq!(outcome.notice.unwrap().title, "Notifications Enabled");
    register.assert_hits(1);
}

fn login_notice_title(role: &str, plan_type: &str) -> String {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/users/sign_in");
        then.status(200).json_body(json!({
            "id": 2,
            "name": "Sam Park",
            "email": "sam@example.com",
            "role": role,
            "token": "tok-2"
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/subscriptions/status")
            .header("Authorization", "Bearer tok-2");
        then.status(200)
            .json_body(json!({ "subscription": { "plan_type": plan_type } }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    let outcome = AuthController::new(&client, &store)
        .login(&LoginForm {
            email: "sam@example.com".into(),
            password: "password123".into(),
        })
        .unwrap();

    assert_eq!(outcome.navigation, Some(Navigation::Push(Route::Home)));
    outcome.notice.unwrap().title
}

#[test]
fn login_notice_names_the_account_kind() {
    assert_eq!(login_notice_title("supervisor", "basic"), "Admin login successful");
    assert_eq!(login_notice_title("user", "basic"), "Login successful - Free user");
    assert_eq!(
        login_notice_title("user", "premium"),
        "Login successful - premium user"
    );
}

#[test]
fn opening_by_id_gates_premium_after_one_fetch() {
    let server = MockServer::start();
    let detail = server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies/2");
        then.status(200).json_body(json!({ "movie": movie_json(2, "Ronin", true) }));
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::User, false);

    let mut home = HomeController::new(&client, &store);
    home.identify();
    let outcome = home.open_movie_by_id(2);

    assert_eq!(outcome.navigation, Some(Navigation::Push(Route::Premium)));
    detail.assert_hits(1);

    stored_session(&store, Role::User, true);
    home.identify();
    let outcome = home.open_movie_by_id(2);
    assert!(matches!(
        outcome.navigation,
        Some(Navigation::Push(Route::Movie(ref movie))) if movie.id == 2
    ));
    detail.assert_hits(2);
}

#[test]
fn opening_by_id_turns_network_failure_into_notice() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/movies/3");
        then.status(503);
    });

    let client = client_for(&server);
    let store = SessionStore::in_memory();
    stored_session(&store, Role::Supervisor, false);

    let mut home = HomeController::new(&client, &store);
    home.identify();
    let outcome = home.open_movie_by_id(3);

    let notice = outcome.notice.unwrap();
    assert!(notice.is_error());
    assert_eq!(notice.title, "Oops!");
    assert_eq!(outcome.navigation, None);
}
