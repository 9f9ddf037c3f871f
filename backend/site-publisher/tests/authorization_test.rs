//! Service Tests: Authorization
//!
//! Owners and members of the business may act; everyone else is refused
//! before any storage or CDN call.

mod common;

use common::{Harness, BUSINESS, WEBSITE};
use site_publisher::error::AppError;
use site_publisher::models::{PageSpec, Role};

fn home() -> Vec<PageSpec> {
    vec![PageSpec::new("Home", "<p>hi</p>", "")]
}

fn assert_no_side_effects(h: &Harness) {
    assert_eq!(h.objects.calls().total(), 0);
    assert_eq!(h.cdn.calls().total(), 0);
    assert_eq!(h.websites.writes(), 0);
}

#[tokio::test]
async fn test_owner_may_publish() {
    let h = Harness::new();
    assert!(h.publisher.publish(BUSINESS, BUSINESS, WEBSITE, &home()).await.is_ok());
    assert_eq!(h.profiles.lookups(), 0);
}

#[tokio::test]
async fn test_member_of_business_may_publish() {
    let h = Harness::new();
    h.profiles.add("staff_1", Role::Member, Some(BUSINESS));

    assert!(h.publisher.publish("staff_1", BUSINESS, WEBSITE, &home()).await.is_ok());
}

#[tokio::test]
async fn test_member_of_other_business_is_forbidden() {
    let h = Harness::new();
    h.profiles.add("staff_2", Role::Member, Some("biz_2"));

    let err = h
        .publisher
        .publish("staff_2", BUSINESS, WEBSITE, &home())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_no_side_effects(&h);
}

#[tokio::test]
async fn test_customer_is_forbidden_everywhere() {
    let h = Harness::with_distribution(false);
    h.profiles.add("cust_1", Role::Customer, Some(BUSINESS));
    let caller = "cust_1";

    let results = vec![
        h.publisher.publish(caller, BUSINESS, WEBSITE, &home()).await.err(),
        h.publisher.list_files(caller, BUSINESS, WEBSITE).await.err(),
        h.publisher.list_media(caller, BUSINESS, WEBSITE).await.err(),
        h.publisher.distribution_status(caller, BUSINESS, WEBSITE).await.err(),
        h.publisher.invalidate(caller, BUSINESS, WEBSITE, None, None).await.err(),
        h.publisher.disable_distribution(caller, BUSINESS, WEBSITE).await.err(),
        h.publisher.delete_distribution(caller, BUSINESS, WEBSITE, None).await.err(),
        h.publisher.create_distribution(caller, BUSINESS, WEBSITE, None).await.err(),
        h.publisher.delete_website(caller, BUSINESS, WEBSITE).await.err(),
    ];

    for result in results {
        assert!(matches!(result, Some(AppError::Forbidden(_))));
    }
    assert_no_side_effects(&h);
    assert!(h.cdn.exists(common::DISTRIBUTION));
}

#[tokio::test]
async fn test_profile_lookup_failure_denies() {
    let h = Harness::new();
    h.profiles.add("staff_1", Role::Member, Some(BUSINESS));
    h.profiles.fail();

    let err = h
        .publisher
        .publish("staff_1", BUSINESS, WEBSITE, &home())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_no_side_effects(&h);
}

#[tokio::test]
async fn test_invalid_ids_are_rejected_before_authorization() {
    let h = Harness::new();

    let err = h
        .publisher
        .publish(BUSINESS, "../etc", WEBSITE, &home())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(h.profiles.lookups(), 0);
    assert_no_side_effects(&h);
}
