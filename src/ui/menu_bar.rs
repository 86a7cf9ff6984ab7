//! The application's main menu.
//!
//! The overlay has no menu of its own, but the app and Edit menus have to
//! exist for ⌘Q, the clipboard shortcuts and dictation to reach the edit
//! field. Items target the responder chain.

use objc2::rc::Retained;
use objc2::runtime::Sel;
use objc2::{ClassType, MainThreadOnly, msg_send, sel};
use objc2_app_kit::{NSMenu, NSMenuItem};
use objc2_foundation::{MainThreadMarker, NSString};

const APP_NAME: &str = "SpaceLabel";

fn make_menu_item(
    mtm: MainThreadMarker,
    title: &str,
    action: Option<Sel>,
    key_equivalent: &str,
) -> Retained<NSMenuItem> {
    let ns_title = NSString::from_str(title);
    let ns_key = NSString::from_str(key_equivalent);
    unsafe {
        msg_send![NSMenuItem::alloc(mtm), initWithTitle: &*ns_title, action: action, keyEquivalent: &*ns_key]
    }
}

fn make_menu(mtm: MainThreadMarker, title: &str) -> Retained<NSMenu> {
    let title = NSString::from_str(title);
    unsafe { msg_send![NSMenu::alloc(mtm), initWithTitle: &*title] }
}

fn add_separator(menu: &NSMenu) {
    let separator: Retained<NSMenuItem> = unsafe { msg_send![NSMenuItem::class(), separatorItem] };
    menu.addItem(&separator);
}

fn add_submenu(mtm: MainThreadMarker, main: &NSMenu, submenu: &NSMenu) {
    let item = make_menu_item(mtm, "", None, "");
    item.setSubmenu(Some(submenu));
    main.addItem(&item);
}

fn build_app_menu(mtm: MainThreadMarker) -> Retained<NSMenu> {
    let menu = make_menu(mtm, APP_NAME);
    menu.addItem(&make_menu_item(
        mtm,
        &format!("About {APP_NAME}"),
        Some(sel!(orderFrontStandardAboutPanel:)),
        "",
    ));
    add_separator(&menu);
    menu.addItem(&make_menu_item(mtm, &format!("Quit {APP_NAME}"), Some(sel!(terminate:)), "q"));
    menu
}

fn build_edit_menu(mtm: MainThreadMarker) -> Retained<NSMenu> {
    let menu = make_menu(mtm, "Edit");
    for (title, action, key) in [
        ("Cut", sel!(cut:), "x"),
        ("Copy", sel!(copy:), "c"),
        ("Paste", sel!(paste:), "v"),
        ("Select All", sel!(selectAll:), "a"),
    ] {
        menu.addItem(&make_menu_item(mtm, title, Some(action), key));
    }
    menu
}

pub fn build_main_menu(mtm: MainThreadMarker) -> Retained<NSMenu> {
    let main = make_menu(mtm, "");
    add_submenu(mtm, &main, &build_app_menu(mtm));
    add_submenu(mtm, &main, &build_edit_menu(mtm));
    main
}
