//! The floating label window and the Objective-C target behind its controls.

use std::cell::RefCell;
use std::time::Duration;

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject, Sel};
use objc2::{DefinedClass, MainThreadOnly, define_class, msg_send, sel};
use objc2_app_kit::{
    NSAnimationContext, NSApplication, NSBackingStoreType, NSButton, NSClickGestureRecognizer,
    NSColor, NSControl, NSControlTextEditingDelegate, NSFloatingWindowLevel, NSFont,
    NSFontWeightMedium, NSFontWeightSemibold, NSImage, NSImageScaling, NSLineBreakMode,
    NSResponder, NSScreen, NSTextAlignment, NSTextField, NSTextFieldBezelStyle,
    NSTextFieldDelegate, NSTextView, NSView, NSVisualEffectBlendingMode, NSVisualEffectMaterial,
    NSVisualEffectState, NSVisualEffectView, NSWindow, NSWindowButton,
    NSWindowCollectionBehavior, NSWindowStyleMask, NSWindowTitleVisibility,
};
use objc2_core_foundation::{CGAffineTransform, CGPoint, CGRect, CGSize};
use objc2_foundation::{MainThreadMarker, NSObject, NSObjectProtocol, NSString};
use objc2_quartz_core::CALayer;
use tracing::{debug, trace};

use crate::common::config::{
    AppearanceSettings, BehaviorSettings, Chrome, ColorScheme, Swatch, SystemColor,
};
use crate::model::display::DisplayState;
use crate::sys::dispatch;

const CORNER_RADIUS: f64 = 10.0;
const BORDER_WIDTH: f64 = 0.5;
const DOT_SIZE: f64 = 10.0;
const DOT_X: f64 = 14.0;
const BUTTON_SIZE: f64 = 24.0;
const LABEL_X: f64 = 30.0;
const LABEL_HEIGHT: f64 = 22.0;
const FIELD_INSET: f64 = 8.0;
const FIELD_HEIGHT: f64 = 28.0;
const LABEL_FONT_SIZE: f64 = 17.0;
const FIELD_FONT_SIZE: f64 = 15.0;
const PULSE_SCALE: f64 = 1.02;
const PULSE_DURATION: Duration = Duration::from_millis(100);

/// What the user asked the overlay to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    BeginEdit,
    Commit,
    Cancel,
    Clear,
    SpaceChanged,
    TakeFocus,
}

pub type ActionSink = Box<dyn Fn(OverlayAction)>;

pub struct OverlayTargetIvars {
    sink: RefCell<Option<ActionSink>>,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "SpaceLabelOverlayTarget"]
    #[ivars = OverlayTargetIvars]
    pub struct OverlayTarget;

    impl OverlayTarget {
        #[unsafe(method(onEdit:))]
        fn on_edit(&self, _sender: Option<&AnyObject>) { self.emit(OverlayAction::BeginEdit); }

        #[unsafe(method(onClear:))]
        fn on_clear(&self, _sender: Option<&AnyObject>) { self.emit(OverlayAction::Clear); }
    }

    unsafe impl NSObjectProtocol for OverlayTarget {}

    unsafe impl NSControlTextEditingDelegate for OverlayTarget {
        #[unsafe(method(control:textView:doCommandBySelector:))]
        fn control_do_command_by_selector(
            &self,
            _control: &NSControl,
            _text_view: &NSTextView,
            command: Sel,
        ) -> bool {
            if command == sel!(insertNewline:) {
                self.emit(OverlayAction::Commit);
                true
            } else if command == sel!(cancelOperation:) {
                self.emit(OverlayAction::Cancel);
                true
            } else {
                false
            }
        }
    }

    unsafe impl NSTextFieldDelegate for OverlayTarget {}
);

impl OverlayTarget {
    pub fn new(mtm: MainThreadMarker) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(OverlayTargetIvars { sink: RefCell::new(None) });
        unsafe { msg_send![super(this), init] }
    }

    /// Routes every control event to `sink` from now on.
    pub fn set_sink(&self, sink: ActionSink) { *self.ivars().sink.borrow_mut() = Some(sink); }

    fn emit(&self, action: OverlayAction) {
        trace!(?action, "Overlay control fired");
        if let Some(sink) = &*self.ivars().sink.borrow() {
            sink(action);
        }
    }
}

define_class!(
    // Borderless windows refuse key status by default, which would keep the
    // edit field from taking input.
    #[unsafe(super(NSWindow, NSResponder, NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "SpaceLabelOverlayWindow"]
    pub struct OverlayWindow;

    impl OverlayWindow {
        #[unsafe(method(canBecomeKeyWindow))]
        fn can_become_key_window(&self) -> bool { true }

        #[unsafe(method(canBecomeMainWindow))]
        fn can_become_main_window(&self) -> bool { true }
    }
);

impl OverlayWindow {
    fn new(mtm: MainThreadMarker, frame: CGRect, style: NSWindowStyleMask) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(());
        unsafe {
            msg_send![
                super(this),
                initWithContentRect: frame,
                styleMask: style,
                backing: NSBackingStoreType::Buffered,
                defer: false
            ]
        }
    }
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> CGRect {
    CGRect::new(CGPoint::new(x, y), CGSize::new(w, h))
}

fn system_color(color: SystemColor) -> Retained<NSColor> {
    match color {
        SystemColor::Green => NSColor::systemGreenColor(),
        SystemColor::Red => NSColor::systemRedColor(),
        SystemColor::Accent => NSColor::controlAccentColor(),
        SystemColor::Gray => NSColor::systemGrayColor(),
        SystemColor::TertiaryLabel => NSColor::tertiaryLabelColor(),
    }
}

fn fill_layer(view: &NSView, swatch: Swatch) {
    let color = system_color(swatch.color).colorWithAlphaComponent(swatch.alpha);
    if let Some(layer) = view.layer() {
        layer.setBackgroundColor(Some(&color.CGColor()));
    }
}

fn round_layer(view: &NSView, radius: f64) {
    view.setWantsLayer(true);
    if let Some(layer) = view.layer() {
        layer.setCornerRadius(radius);
        layer.setMasksToBounds(true);
    }
}

fn icon_button(
    mtm: MainThreadMarker,
    frame: CGRect,
    symbol: &str,
    tooltip: &str,
    target: &OverlayTarget,
    action: Sel,
) -> Retained<NSButton> {
    let button = NSButton::initWithFrame(NSButton::alloc(mtm), frame);
    button.setBordered(false);
    let description = NSString::from_str(tooltip);
    let symbol = NSString::from_str(symbol);
    if let Some(image) =
        NSImage::imageWithSystemSymbolName_accessibilityDescription(&symbol, Some(&description))
    {
        button.setImage(Some(&image));
        button.setImageScaling(NSImageScaling::ScaleProportionallyDown);
    }
    button.setContentTintColor(Some(&NSColor::secondaryLabelColor()));
    let target: &AnyObject = target;
    unsafe {
        button.setTarget(Some(target));
        button.setAction(Some(action));
    }
    button.setToolTip(Some(&description));
    button
}

/// The AppKit views making up the overlay. Holds no state of its own beyond
/// what is on screen; [`OverlayView::render`] is called after every change.
pub struct OverlayView {
    mtm: MainThreadMarker,
    window: Retained<OverlayWindow>,
    content: Retained<NSVisualEffectView>,
    tint: Retained<NSView>,
    dot: Retained<NSView>,
    label: Retained<NSTextField>,
    edit_button: Retained<NSButton>,
    clear_button: Retained<NSButton>,
    edit_field: Retained<NSTextField>,
    scheme: ColorScheme,
}

impl OverlayView {
    pub fn new(
        mtm: MainThreadMarker,
        appearance: &AppearanceSettings,
        behavior: &BehaviorSettings,
        target: &OverlayTarget,
    ) -> Self {
        let (w, h) = (appearance.width, appearance.height);
        let window = Self::build_window(mtm, appearance);

        let content =
            NSVisualEffectView::initWithFrame(NSVisualEffectView::alloc(mtm), rect(0.0, 0.0, w, h));
        content.setMaterial(NSVisualEffectMaterial::HUDWindow);
        content.setState(NSVisualEffectState::Active);
        content.setBlendingMode(NSVisualEffectBlendingMode::BehindWindow);
        if appearance.chrome == Chrome::Hud {
            round_layer(&content, CORNER_RADIUS);
            if let Some(layer) = content.layer() {
                layer.setBorderWidth(BORDER_WIDTH);
                let border = NSColor::whiteColor().colorWithAlphaComponent(0.15);
                layer.setBorderColor(Some(&border.CGColor()));
            }
        } else {
            content.setWantsLayer(true);
        }
        window.setContentView(Some(&content));

        let tint = NSView::initWithFrame(NSView::alloc(mtm), rect(0.0, 0.0, w, h));
        round_layer(&tint, if appearance.chrome == Chrome::Hud { CORNER_RADIUS } else { 0.0 });
        content.addSubview(&tint);

        let dot = NSView::initWithFrame(
            NSView::alloc(mtm),
            rect(DOT_X, (h - DOT_SIZE) / 2.0, DOT_SIZE, DOT_SIZE),
        );
        round_layer(&dot, DOT_SIZE / 2.0);
        content.addSubview(&dot);

        let label = NSTextField::labelWithString(&NSString::from_str(""), mtm);
        label.setFont(Some(&NSFont::systemFontOfSize_weight(LABEL_FONT_SIZE, unsafe {
            NSFontWeightSemibold
        })));
        label.setTextColor(Some(&NSColor::labelColor()));
        label.setAlignment(NSTextAlignment::Center);
        label.setLineBreakMode(NSLineBreakMode::ByTruncatingTail);
        // Room on the right for the clear and edit buttons.
        let label_width = w - LABEL_X - 2.0 * BUTTON_SIZE - 12.0;
        label.setFrame(rect(LABEL_X, (h - LABEL_HEIGHT) / 2.0, label_width, LABEL_HEIGHT));
        let target_object: &AnyObject = target;
        let recognizer = unsafe {
            NSClickGestureRecognizer::initWithTarget_action(
                NSClickGestureRecognizer::alloc(mtm),
                Some(target_object),
                Some(sel!(onEdit:)),
            )
        };
        recognizer.setNumberOfClicksRequired(behavior.edit_trigger.clicks());
        label.addGestureRecognizer(&recognizer);
        content.addSubview(&label);

        let button_y = (h - BUTTON_SIZE) / 2.0;
        let edit_button = icon_button(
            mtm,
            rect(w - BUTTON_SIZE - 8.0, button_y, BUTTON_SIZE, BUTTON_SIZE),
            "pencil",
            "Rename space",
            target,
            sel!(onEdit:),
        );
        content.addSubview(&edit_button);

        let clear_button = icon_button(
            mtm,
            rect(w - 2.0 * BUTTON_SIZE - 10.0, button_y, BUTTON_SIZE, BUTTON_SIZE),
            "xmark.circle.fill",
            "Clear name",
            target,
            sel!(onClear:),
        );
        clear_button.setHidden(true);
        content.addSubview(&clear_button);

        let edit_field = NSTextField::initWithFrame(
            NSTextField::alloc(mtm),
            rect(FIELD_INSET, (h - FIELD_HEIGHT) / 2.0, w - 2.0 * FIELD_INSET, FIELD_HEIGHT),
        );
        edit_field.setFont(Some(&NSFont::systemFontOfSize_weight(FIELD_FONT_SIZE, unsafe {
            NSFontWeightMedium
        })));
        edit_field.setAlignment(NSTextAlignment::Center);
        edit_field.setPlaceholderString(Some(&NSString::from_str("Enter name...")));
        edit_field.setBezeled(true);
        edit_field.setBezelStyle(NSTextFieldBezelStyle::RoundedBezel);
        edit_field.setDrawsBackground(true);
        edit_field.setEditable(true);
        edit_field.setSelectable(true);
        edit_field.setUsesSingleLineMode(true);
        edit_field.setAllowsEditingTextAttributes(false);
        edit_field.setImportsGraphics(false);
        #[allow(unused_unsafe)]
        unsafe {
            edit_field.setDelegate(Some(ProtocolObject::from_ref(target)));
        }
        edit_field.setHidden(true);
        content.addSubview(&edit_field);

        Self {
            mtm,
            window,
            content,
            tint,
            dot,
            label,
            edit_button,
            clear_button,
            edit_field,
            scheme: appearance.scheme,
        }
    }

    fn build_window(
        mtm: MainThreadMarker,
        appearance: &AppearanceSettings,
    ) -> Retained<OverlayWindow> {
        let screen =
            NSScreen::mainScreen(mtm).map(|s| s.frame()).unwrap_or(rect(0.0, 0.0, 0.0, 0.0));
        let (x, y) = appearance.place(
            (screen.origin.x, screen.origin.y),
            (screen.size.width, screen.size.height),
        );
        let frame = rect(x, y, appearance.width, appearance.height);
        let style = match appearance.chrome {
            Chrome::Hud => NSWindowStyleMask::Borderless,
            Chrome::Titled => NSWindowStyleMask::Titled | NSWindowStyleMask::FullSizeContentView,
        };
        debug!(?frame, chrome = ?appearance.chrome, "Creating overlay window");

        let window = OverlayWindow::new(mtm, frame, style);
        unsafe { window.setReleasedWhenClosed(false) };
        window.setOpaque(false);
        window.setBackgroundColor(Some(&NSColor::clearColor()));
        window.setLevel(NSFloatingWindowLevel);
        window.setCollectionBehavior(
            NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::FullScreenAuxiliary
                | NSWindowCollectionBehavior::Stationary
                | NSWindowCollectionBehavior::IgnoresCycle,
        );
        window.setMovableByWindowBackground(true);
        window.setHasShadow(true);
        window.setTitlebarAppearsTransparent(true);
        window.setTitleVisibility(NSWindowTitleVisibility::Hidden);
        if appearance.chrome == Chrome::Titled {
            for kind in [
                NSWindowButton::CloseButton,
                NSWindowButton::MiniaturizeButton,
                NSWindowButton::ZoomButton,
            ] {
                if let Some(button) = window.standardWindowButton(kind) {
                    button.setHidden(true);
                }
            }
        }
        window
    }

    pub fn render(&self, state: &DisplayState) {
        self.label.setStringValue(&NSString::from_str(&state.text));
        let palette = self.scheme.palette(state.labeled);
        fill_layer(&self.tint, palette.tint);
        fill_layer(&self.dot, palette.dot);
        if self.edit_field.isHidden() {
            self.edit_button.setHidden(!state.can_edit());
            self.clear_button.setHidden(!state.shows_clear());
        }
    }

    pub fn show(&self) { self.window.orderFrontRegardless(); }

    /// Brings the app forward and gives the overlay key status, which
    /// dictation and the text field both need.
    pub fn take_focus(&self) {
        let app = NSApplication::sharedApplication(self.mtm);
        #[allow(deprecated)]
        app.activateIgnoringOtherApps(true);
        self.window.makeKeyAndOrderFront(None);
    }

    pub fn show_editor(&self, text: &str) {
        self.label.setHidden(true);
        self.edit_button.setHidden(true);
        self.clear_button.setHidden(true);
        self.dot.setHidden(true);

        self.edit_field.setStringValue(&NSString::from_str(text));
        self.edit_field.setHidden(false);
        self.take_focus();

        // The window only accepts a first responder once it is key, which
        // happens after this event has been handled.
        dispatch::async_on_main(
            self.mtm,
            (self.window.clone(), self.edit_field.clone()),
            |(window, field)| {
                window.makeFirstResponder(Some(&field));
                if let Some(editor) = field.currentEditor() {
                    editor.selectAll(None);
                }
            },
        );
    }

    pub fn hide_editor(&self) {
        self.edit_field.setHidden(true);
        self.label.setHidden(false);
        self.dot.setHidden(false);
        self.edit_button.setHidden(false);
    }

    pub fn editor_text(&self) -> String { self.edit_field.stringValue().to_string() }

    /// Briefly scales the overlay up to acknowledge a save.
    pub fn pulse(&self) {
        let Some(layer) = self.content.layer() else { return };
        animate_transform(self.mtm, &layer, scale_transform(PULSE_SCALE));
        dispatch::after_on_main(self.mtm, PULSE_DURATION, layer, |layer| {
            if let Some(mtm) = MainThreadMarker::new() {
                animate_transform(mtm, &layer, scale_transform(1.0));
            }
        });
    }
}

fn scale_transform(scale: f64) -> CGAffineTransform {
    CGAffineTransform {
        a: scale,
        b: 0.0,
        c: 0.0,
        d: scale,
        tx: 0.0,
        ty: 0.0,
    }
}

// View-backed layers only animate inside an animation group that allows
// implicit animation.
fn animate_transform(mtm: MainThreadMarker, layer: &CALayer, transform: CGAffineTransform) {
    NSAnimationContext::beginGrouping(mtm);
    let context = NSAnimationContext::currentContext(mtm);
    context.setDuration(PULSE_DURATION.as_secs_f64());
    context.setAllowsImplicitAnimation(true);
    layer.setAffineTransform(transform);
    NSAnimationContext::endGrouping(mtm);
}
