use stencil_core::{Area, CurrentUser, Role};
use stencil_editor::EditorConfig;
use stencil_session::{AppContext, LocalStore, Theme, STORE_FILE_EXT, USER_KEY};

#[test]
fn store_roundtrip() {
    let path = std::path::PathBuf::from(format!("target/test_store.{STORE_FILE_EXT}"));
    let _ = std::fs::remove_file(&path);

    let mut ctx = AppContext::init(&path).unwrap();
    assert!(ctx.current_user().is_none());

    let user = CurrentUser::new("mara@studio.test", Role::Artist).with_name("Mara");
    let landing = ctx.sign_in(user.clone()).unwrap();
    assert_eq!(landing, Area::ArtistDashboard);
    ctx.set_theme(Theme::Light).unwrap();
    ctx.shutdown().unwrap();

    let ctx = AppContext::init(&path).unwrap();
    assert_eq!(ctx.current_user(), Some(&user));
    assert_eq!(ctx.theme(), Theme::Light);

    let store = LocalStore::open(&path).unwrap();
    let stored: CurrentUser = store.get(USER_KEY).unwrap().unwrap();
    assert_eq!(stored.email, "mara@studio.test");

    let editor = ctx.open_editor(EditorConfig::default()).unwrap();
    assert_eq!(editor.owner().id, user.id);
}

#[test]
fn sign_out_survives_restart() {
    let path = std::path::PathBuf::from(format!("target/test_sign_out.{STORE_FILE_EXT}"));
    let _ = std::fs::remove_file(&path);

    let mut ctx = AppContext::init(&path).unwrap();
    ctx.sign_in(CurrentUser::new("c@studio.test", Role::Customer)).unwrap();
    ctx.sign_out();
    ctx.shutdown().unwrap();

    let ctx = AppContext::init(&path).unwrap();
    assert!(ctx.current_user().is_none());
    assert!(ctx.authorize(Area::Booking).is_err());
    assert!(ctx.authorize(Area::Designs).is_ok());
}
