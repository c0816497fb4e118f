use chrono::{Duration, Utc};
use photogram::{
    AppError, InMemoryRepository, TokenService,
    models::{
        CreateCommentRequest, CreateImageRequest, CreateSocialMediaRequest, EditCommentRequest,
        EditImageRequest, EditSocialMediaRequest, EditUserRequest, Image, LoginRequest,
        RegisterUserRequest, User,
    },
    repository::Repository,
    services::{comments, images, social_medias, users},
    token::Identity,
};

// --- Helper Functions ---

const TEST_COST: u32 = 4;

fn identity_of(user: &User) -> Identity {
    Identity {
        subject_id: user.id.clone(),
        email: user.email.clone(),
        issued_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

fn register_request(username: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "secret".to_string(),
        age: 8,
        profile_image_url: None,
    }
}

async fn register(repo: &InMemoryRepository, username: &str) -> (User, Identity) {
    let user = users::register(repo, TEST_COST, register_request(username))
        .await
        .unwrap();
    let identity = identity_of(&user);
    (user, identity)
}

async fn post_image(repo: &InMemoryRepository, identity: &Identity) -> Image {
    images::create(
        repo,
        identity,
        CreateImageRequest {
            title: "A Title".into(),
            caption: Some("A caption".into()),
            image_url: "https://www.example.com/image.jpg".into(),
        },
    )
    .await
    .unwrap()
}

fn expect_validation<T: std::fmt::Debug>(result: Result<T, AppError>) {
    assert!(
        matches!(result, Err(AppError::Validation(_))),
        "expected Validation, got {:?}",
        result
    );
}

// --- Users ---

#[tokio::test]
async fn test_register_stores_hash_not_password() {
    let repo = InMemoryRepository::new();

    let (user, _) = register(&repo, "johndoe").await;

    assert!(user.id.starts_with("user-"));
    assert_ne!(user.password_hash, "secret");
    assert!(bcrypt::verify("secret", &user.password_hash).unwrap());
}

#[tokio::test]
async fn test_register_validation_makes_no_write() {
    let repo = InMemoryRepository::new();

    let mut short_password = register_request("a");
    short_password.password = "12345".into();
    let mut too_young = register_request("b");
    too_young.age = 7;
    let mut bad_email = register_request("c");
    bad_email.email = "not-an-email".into();
    let mut no_username = register_request("d");
    no_username.username = String::new();

    for request in [short_password, too_young, bad_email, no_username] {
        expect_validation(users::register(&repo, TEST_COST, request).await);
    }
    assert_eq!(repo.write_count(), 0);
}

#[tokio::test]
async fn test_register_accepts_single_label_domains() {
    let repo = InMemoryRepository::new();
    let mut request = register_request("johndoe");
    request.email = "johndoe@localhost".into();

    let user = users::register(&repo, TEST_COST, request).await.unwrap();

    assert_eq!(user.email, "johndoe@localhost");
}

#[tokio::test]
async fn test_register_reports_each_invalid_field() {
    let repo = InMemoryRepository::new();
    let mut request = register_request("johndoe");
    request.password = "12345".into();
    request.age = 7;

    let err = users::register(&repo, TEST_COST, request).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Validation(ref m)
            if m == "age must be at least 8, password must be at least 6 characters"
    ));
}

#[tokio::test]
async fn test_register_reports_taken_username_and_email() {
    let repo = InMemoryRepository::new();
    register(&repo, "johndoe").await;

    let mut same_username = register_request("johndoe");
    same_username.email = "other@example.com".into();
    let err = users::register(&repo, TEST_COST, same_username).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "the username you entered has been used"));

    let mut same_email = register_request("janedoe");
    same_email.email = "johndoe@example.com".into();
    let err = users::register(&repo, TEST_COST, same_email).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "the email you entered has been used"));
}

#[tokio::test]
async fn test_login_issues_token_for_the_user() {
    let repo = InMemoryRepository::new();
    let tokens = TokenService::new("secret", Duration::hours(1));
    let (user, _) = register(&repo, "johndoe").await;

    let token = users::login(
        &repo,
        &tokens,
        LoginRequest {
            email: "johndoe@example.com".into(),
            password: "secret".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(tokens.verify(&token).unwrap().subject_id, user.id);
}

#[tokio::test]
async fn test_login_rejects_wrong_credentials() {
    let repo = InMemoryRepository::new();
    let tokens = TokenService::new("secret", Duration::hours(1));
    register(&repo, "johndoe").await;

    for (email, password) in [
        ("johndoe@example.com", "wrong-password"),
        ("nobody@example.com", "secret"),
    ] {
        let err = users::login(
            &repo,
            &tokens,
            LoginRequest {
                email: email.into(),
                password: password.into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "the credential you entered are wrong"));
    }
}

#[tokio::test]
async fn test_edit_user_changes_only_given_fields() {
    let repo = InMemoryRepository::new();
    let (user, identity) = register(&repo, "johndoe").await;

    let edited = users::edit(
        &repo,
        &identity,
        EditUserRequest {
            email: None,
            username: Some("johnny".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(edited.username, "johnny");
    assert_eq!(edited.email, user.email);
    assert!(edited.updated_at >= edited.created_at);
}

#[tokio::test]
async fn test_edit_user_rejects_invalid_email_and_taken_username() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    register(&repo, "janedoe").await;

    expect_validation(
        users::edit(
            &repo,
            &identity,
            EditUserRequest {
                email: Some("broken".into()),
                username: None,
            },
        )
        .await,
    );

    let err = users::edit(
        &repo,
        &identity,
        EditUserRequest {
            email: None,
            username: Some("janedoe".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let repo = InMemoryRepository::new();
    let (_, alice) = register(&repo, "alice").await;
    let (_, bob) = register(&repo, "bob").await;
    let image = post_image(&repo, &alice).await;
    comments::create(
        &repo,
        &bob,
        CreateCommentRequest {
            message: "nice".into(),
            image_id: image.id.clone(),
        },
    )
    .await
    .unwrap();

    users::delete(&repo, &alice).await.unwrap();

    assert!(images::list(&repo).await.unwrap().is_empty());
    // Bob's comment went with the image it was on.
    assert!(comments::list(&repo, &bob).await.unwrap().is_empty());
    assert!(repo.get_user(&alice.subject_id).await.unwrap().is_none());

    let err = users::delete(&repo, &alice).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m == "account not found"));
}

// --- Images ---

#[tokio::test]
async fn test_create_image_requires_title_and_url() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let writes = repo.write_count();

    expect_validation(
        images::create(
            &repo,
            &identity,
            CreateImageRequest {
                title: "".into(),
                caption: None,
                image_url: "https://x.io/a.jpg".into(),
            },
        )
        .await,
    );
    expect_validation(
        images::create(
            &repo,
            &identity,
            CreateImageRequest {
                title: "A Title".into(),
                caption: None,
                image_url: "  ".into(),
            },
        )
        .await,
    );

    assert_eq!(repo.write_count(), writes);
}

#[tokio::test]
async fn test_create_image_is_owned_by_caller() {
    let repo = InMemoryRepository::new();
    let (user, identity) = register(&repo, "johndoe").await;

    let image = post_image(&repo, &identity).await;

    assert!(image.id.starts_with("image-"));
    assert_eq!(image.user_id, user.id);
    assert_eq!(image.created_at, image.updated_at);
}

#[tokio::test]
async fn test_edit_image_keeps_owner_and_merges_fields() {
    let repo = InMemoryRepository::new();
    let (user, identity) = register(&repo, "johndoe").await;
    let image = post_image(&repo, &identity).await;

    let edited = images::edit(
        &repo,
        &identity,
        &image.id,
        EditImageRequest {
            title: Some("New Title".into()),
            caption: None,
            image_url: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(edited.user_id, user.id);
    assert_eq!(edited.title, "New Title");
    assert_eq!(edited.caption, image.caption);
    assert_eq!(edited.image_url, image.image_url);
    assert!(edited.updated_at >= edited.created_at);
}

#[tokio::test]
async fn test_edit_image_empty_strings() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let image = post_image(&repo, &identity).await;

    // An empty caption clears it.
    let cleared = images::edit(
        &repo,
        &identity,
        &image.id,
        EditImageRequest {
            title: None,
            caption: Some(String::new()),
            image_url: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.caption, None);

    // An empty title is rejected and nothing is written.
    let writes = repo.write_count();
    expect_validation(
        images::edit(
            &repo,
            &identity,
            &image.id,
            EditImageRequest {
                title: Some(String::new()),
                caption: None,
                image_url: None,
            },
        )
        .await,
    );
    assert_eq!(repo.write_count(), writes);
}

#[tokio::test]
async fn test_edit_without_changes_skips_the_write() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let image = post_image(&repo, &identity).await;
    let writes = repo.write_count();

    let same = images::edit(&repo, &identity, &image.id, EditImageRequest::default())
        .await
        .unwrap();

    assert_eq!(same, image);
    assert_eq!(repo.write_count(), writes);
}

#[tokio::test]
async fn test_delete_image_twice_is_not_found() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let image = post_image(&repo, &identity).await;

    images::delete(&repo, &identity, &image.id).await.unwrap();
    let err = images::delete(&repo, &identity, &image.id).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_images_carries_author_summary() {
    let repo = InMemoryRepository::new();
    let (user, identity) = register(&repo, "johndoe").await;
    post_image(&repo, &identity).await;

    let listed = images::list(&repo).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user.email, user.email);
    assert_eq!(listed[0].user.username, user.username);
}

// --- Comments ---

#[tokio::test]
async fn test_comment_on_missing_image_is_not_found() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let writes = repo.write_count();

    let err = comments::create(
        &repo,
        &identity,
        CreateCommentRequest {
            message: "A comment".into(),
            image_id: "image-123".into(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::NotFound(ref m) if m == "image with id image-123 doesn't exist"));
    assert_eq!(repo.write_count(), writes);
}

#[tokio::test]
async fn test_comment_requires_message_and_image() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let writes = repo.write_count();

    expect_validation(
        comments::create(
            &repo,
            &identity,
            CreateCommentRequest {
                message: "".into(),
                image_id: "image-123".into(),
            },
        )
        .await,
    );
    expect_validation(
        comments::create(
            &repo,
            &identity,
            CreateCommentRequest {
                message: "A comment".into(),
                image_id: "".into(),
            },
        )
        .await,
    );

    assert_eq!(repo.write_count(), writes);
}

#[tokio::test]
async fn test_comment_edit_returns_the_image() {
    let repo = InMemoryRepository::new();
    let (_, alice) = register(&repo, "alice").await;
    let (bob_user, bob) = register(&repo, "bob").await;
    let image = post_image(&repo, &alice).await;
    let comment = comments::create(
        &repo,
        &bob,
        CreateCommentRequest {
            message: "first".into(),
            image_id: image.id.clone(),
        },
    )
    .await
    .unwrap();
    assert_eq!(comment.user_id, bob_user.id);

    let returned = comments::edit(
        &repo,
        &bob,
        &comment.id,
        EditCommentRequest {
            message: Some("second".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(returned.id, image.id);
    let stored = repo.get_comment(&comment.id).await.unwrap().unwrap();
    assert_eq!(stored.message, "second");
    assert_eq!(stored.user_id, bob_user.id);
    assert_eq!(stored.image_id, image.id);
}

#[tokio::test]
async fn test_comment_list_is_scoped_to_caller() {
    let repo = InMemoryRepository::new();
    let (_, alice) = register(&repo, "alice").await;
    let (_, bob) = register(&repo, "bob").await;
    let image = post_image(&repo, &alice).await;
    for (who, message) in [(&alice, "from alice"), (&bob, "from bob")] {
        comments::create(
            &repo,
            who,
            CreateCommentRequest {
                message: message.into(),
                image_id: image.id.clone(),
            },
        )
        .await
        .unwrap();
    }

    let listed = comments::list(&repo, &bob).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].comment.message, "from bob");
    assert_eq!(listed[0].user.username, "bob");
    assert_eq!(listed[0].image.id, image.id);
}

#[tokio::test]
async fn test_delete_missing_comment_has_no_side_effects() {
    let repo = InMemoryRepository::new();
    let (_, identity) = register(&repo, "johndoe").await;
    let writes = repo.write_count();

    let err = comments::delete(&repo, &identity, "comment-404").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(repo.write_count(), writes);
}

// --- Social Media ---

#[tokio::test]
async fn test_social_media_lifecycle() {
    let repo = InMemoryRepository::new();
    let (user, identity) = register(&repo, "johndoe").await;

    expect_validation(
        social_medias::create(
            &repo,
            &identity,
            CreateSocialMediaRequest {
                name: "Example".into(),
                social_media_url: "".into(),
            },
        )
        .await,
    );

    let link = social_medias::create(
        &repo,
        &identity,
        CreateSocialMediaRequest {
            name: "Example".into(),
            social_media_url: "https://www.example.com/johndoe".into(),
        },
    )
    .await
    .unwrap();
    assert!(link.id.starts_with("socialmedia-"));

    let edited = social_medias::edit(
        &repo,
        &identity,
        &link.id,
        EditSocialMediaRequest {
            name: Some("Renamed".into()),
            social_media_url: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(edited.name, "Renamed");
    assert_eq!(edited.social_media_url, link.social_media_url);
    assert_eq!(edited.user_id, user.id);

    let listed = social_medias::list(&repo, &identity).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user.username, "johndoe");

    social_medias::delete(&repo, &identity, &link.id).await.unwrap();
    assert!(social_medias::list(&repo, &identity).await.unwrap().is_empty());
}
