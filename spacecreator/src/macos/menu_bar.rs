use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Sel};
use objc2::{define_class, msg_send, sel, ClassType, DefinedClass, MainThreadOnly};
use objc2_app_kit::{NSImage, NSMenu, NSMenuItem, NSStatusBar, NSStatusItem, NSVariableStatusItemLength};
use objc2_foundation::{MainThreadMarker, NSObject, NSString};
use spacecreator_ipc::Command;
use tokio::sync::mpsc::UnboundedSender;

const STATUS_SYMBOL: &str = "square.grid.2x2";
const STATUS_DESCRIPTION: &str = "Space Creator";

/// Status bar item offering the create-space action, a permission check and
/// quit. Menu selections are forwarded as commands.
pub struct MenuBar {
    _status_item: Retained<NSStatusItem>,
    _menu: Retained<NSMenu>,
    _handler: Retained<MenuActionHandler>,
}

impl MenuBar {
    pub fn new(mtm: MainThreadMarker, command_tx: UnboundedSender<Command>, chord: &str) -> Self {
        let status_bar = NSStatusBar::systemStatusBar();
        let status_item = status_bar.statusItemWithLength(NSVariableStatusItemLength);

        if let Some(button) = status_item.button(mtm) {
            let image = NSImage::imageWithSystemSymbolName_accessibilityDescription(
                &NSString::from_str(STATUS_SYMBOL),
                Some(&NSString::from_str(STATUS_DESCRIPTION)),
            );
            button.setImage(image.as_deref());
        }

        let handler = MenuActionHandler::new(mtm, command_tx);
        let menu = NSMenu::new(mtm);
        menu.addItem(&make_menu_item(
            mtm,
            &format!("Create New Space ({})", chord),
            sel!(onCreateSpace:),
            &handler,
            "",
        ));
        add_separator(&menu);
        menu.addItem(&make_menu_item(
            mtm,
            "Check Accessibility Permissions",
            sel!(onCheckPermissions:),
            &handler,
            "",
        ));
        add_separator(&menu);
        menu.addItem(&make_menu_item(mtm, "Quit", sel!(onQuit:), &handler, "q"));

        status_item.setMenu(Some(&menu));
        tracing::info!("Menu bar item installed");

        Self {
            _status_item: status_item,
            _menu: menu,
            _handler: handler,
        }
    }
}

fn make_menu_item(
    mtm: MainThreadMarker,
    title: &str,
    action: Sel,
    target: &MenuActionHandler,
    key_equivalent: &str,
) -> Retained<NSMenuItem> {
    let ns_title = NSString::from_str(title);
    let ns_key = NSString::from_str(key_equivalent);
    let item: Retained<NSMenuItem> = unsafe {
        msg_send![NSMenuItem::alloc(mtm), initWithTitle: &*ns_title, action: Some(action), keyEquivalent: &*ns_key]
    };
    unsafe {
        item.setTarget(Some(target));
    }
    item
}

fn add_separator(menu: &NSMenu) {
    let separator: Retained<NSMenuItem> = unsafe { msg_send![NSMenuItem::class(), separatorItem] };
    menu.addItem(&separator);
}

struct MenuActionHandlerIvars {
    command_tx: UnboundedSender<Command>,
}

impl MenuActionHandler {
    fn new(mtm: MainThreadMarker, command_tx: UnboundedSender<Command>) -> Retained<Self> {
        let this = mtm.alloc().set_ivars(MenuActionHandlerIvars { command_tx });
        unsafe { msg_send![super(this), init] }
    }

    fn emit(&self, command: Command) {
        tracing::debug!("Menu action: {:?}", command);
        if self.ivars().command_tx.send(command).is_err() {
            tracing::error!("Failed to send command from menu");
        }
    }
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "SpaceCreatorMenuActionHandler"]
    #[ivars = MenuActionHandlerIvars]
    struct MenuActionHandler;

    impl MenuActionHandler {
        #[unsafe(method(onCreateSpace:))]
        fn on_create_space(&self, _sender: Option<&AnyObject>) {
            self.emit(Command::CreateSpace);
        }

        #[unsafe(method(onCheckPermissions:))]
        fn on_check_permissions(&self, _sender: Option<&AnyObject>) {
            self.emit(Command::CheckPermissions);
        }

        #[unsafe(method(onQuit:))]
        fn on_quit(&self, _sender: Option<&AnyObject>) {
            self.emit(Command::Quit);
        }
    }
);
