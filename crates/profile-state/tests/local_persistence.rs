//! Exercises the surrealkv engine end to end: the same schema and patch
//! path as the in-memory tests, but against an on-disk database.

use profile_state::store_traits::*;
use profile_state::SurrealProfileStore;

#[tokio::test]
async fn surrealkv_create_patch_and_read_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("surrealkv://{}", dir.path().join("db").display());

    let store = SurrealProfileStore::connect(&url, "skillforge", "test")
        .await
        .expect("connect surrealkv");

    store
        .create_profile(SkillProfile::new(ProfileId::from("p-disk")))
        .await
        .unwrap();

    store
        .update_fields(
            &ProfileId::from("p-disk"),
            ProfilePatch {
                backend_skill: Some(64.0),
                dsa_skill: Some(TaggedScore::new(72.0, SourceId::Submissions)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let profile = store.get_profile(&ProfileId::from("p-disk")).await.unwrap();
    assert_eq!(profile.backend_skill, Some(64.0));
    assert_eq!(profile.dsa_skill, Some(72.0));
    assert_eq!(profile.dsa_skill_source, Some(SourceId::Submissions));
}
