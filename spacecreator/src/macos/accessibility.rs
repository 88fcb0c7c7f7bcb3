use core_foundation::{
    array::CFArray,
    base::{CFTypeID, TCFType},
    boolean::CFBoolean,
    declare_TCFType, impl_TCFType,
    number::CFNumber,
    string::{CFString, CFStringRef},
};
use core_graphics::geometry::CGPoint;
use std::ffi::c_void;
use std::ptr;

pub type AXError = i32;
pub const AX_ERROR_SUCCESS: AXError = 0;
pub const AX_ERROR_FAILURE: AXError = -25200;
pub const AX_ERROR_INVALID_UIELEMENT: AXError = -25202;
pub const AX_ERROR_CANNOT_COMPLETE: AXError = -25204;
pub const AX_ERROR_ATTRIBUTE_UNSUPPORTED: AXError = -25205;
pub const AX_ERROR_API_DISABLED: AXError = -25211;
pub const AX_ERROR_NO_VALUE: AXError = -25212;

#[repr(C)]
pub struct __AXUIElement(c_void);
pub type AXUIElementRef = *mut __AXUIElement;

declare_TCFType!(AXUIElement, AXUIElementRef);
impl_TCFType!(AXUIElement, AXUIElementRef, AXUIElementGetTypeID);

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementGetTypeID() -> CFTypeID;
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;
    fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut *mut c_void,
    ) -> AXError;
    fn AXUIElementPerformAction(element: AXUIElementRef, action: CFStringRef) -> AXError;
    fn AXUIElementSetMessagingTimeout(element: AXUIElementRef, timeout_secs: f32) -> AXError;
    fn AXValueGetValue(value: *const c_void, value_type: u32, value_ptr: *mut c_void) -> bool;
}

const AX_VALUE_TYPE_CGPOINT: u32 = 1;

/// Upper bound for a single AX round-trip to another process.
const MESSAGING_TIMEOUT_SECS: f32 = 1.0;

mod attr {
    pub const CHILDREN: &str = "AXChildren";
    pub const ROLE: &str = "AXRole";
    pub const IDENTIFIER: &str = "AXIdentifier";
    pub const DISPLAY_ID: &str = "AXDisplayID";
    pub const FOCUSED_WINDOW: &str = "AXFocusedWindow";
    pub const POSITION: &str = "AXPosition";
}

const ACTION_PRESS: &str = "AXPress";

pub mod role {
    pub const GROUP: &str = "AXGroup";
    pub const BUTTON: &str = "AXButton";
}

pub fn is_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

pub fn is_trusted_with_prompt() -> bool {
    use core_foundation::dictionary::CFDictionary;

    let key = CFString::new("AXTrustedCheckOptionPrompt");
    let dict = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);

    unsafe { AXIsProcessTrustedWithOptions(dict.as_concrete_TypeRef() as *const c_void) }
}

impl AXUIElement {
    pub fn application(pid: i32) -> Self {
        let element = unsafe {
            let raw = AXUIElementCreateApplication(pid);
            Self::wrap_under_create_rule(raw)
        };
        unsafe {
            AXUIElementSetMessagingTimeout(element.as_concrete_TypeRef(), MESSAGING_TIMEOUT_SECS);
        }
        element
    }

    fn get_attribute(&self, name: &str) -> Result<*mut c_void, AXError> {
        let attr = CFString::new(name);
        let mut value: *mut c_void = ptr::null_mut();
        let err = unsafe {
            AXUIElementCopyAttributeValue(
                self.as_concrete_TypeRef(),
                attr.as_concrete_TypeRef(),
                &mut value,
            )
        };
        if err == AX_ERROR_SUCCESS && !value.is_null() {
            Ok(value)
        } else if err == AX_ERROR_SUCCESS {
            Err(AX_ERROR_NO_VALUE)
        } else {
            Err(err)
        }
    }

    fn get_string(&self, name: &str) -> Result<String, AXError> {
        let value = self.get_attribute(name)?;
        let cf = unsafe { CFString::wrap_under_create_rule(value as *const _) };
        Ok(cf.to_string())
    }

    pub fn role(&self) -> Result<String, AXError> {
        self.get_string(attr::ROLE)
    }

    pub fn identifier(&self) -> Result<String, AXError> {
        self.get_string(attr::IDENTIFIER)
    }

    /// Display id exposed by the overview's per-display containers.
    pub fn display_id(&self) -> Result<u32, AXError> {
        let value = self.get_attribute(attr::DISPLAY_ID)?;
        let number = unsafe { CFNumber::wrap_under_create_rule(value as *const _) };
        number
            .to_i64()
            .map(|id| id as u32)
            .ok_or(AX_ERROR_FAILURE)
    }

    pub fn position(&self) -> Result<CGPoint, AXError> {
        let value = self.get_attribute(attr::POSITION)?;
        let mut point = CGPoint::new(0.0, 0.0);
        let ok = unsafe {
            AXValueGetValue(
                value,
                AX_VALUE_TYPE_CGPOINT,
                &mut point as *mut CGPoint as *mut c_void,
            )
        };
        // The copied AXValue is owned by us.
        unsafe { core_foundation_sys::base::CFRelease(value as *const c_void) };
        if ok {
            Ok(point)
        } else {
            Err(AX_ERROR_FAILURE)
        }
    }

    pub fn children(&self) -> Result<Vec<AXUIElement>, AXError> {
        let value = self.get_attribute(attr::CHILDREN)?;
        let arr: CFArray = unsafe { CFArray::wrap_under_create_rule(value as *const _) };
        let mut result = Vec::with_capacity(arr.len() as usize);
        for i in 0..arr.len() {
            let elem = unsafe {
                let ptr = *arr.get_unchecked(i);
                AXUIElement::wrap_under_get_rule(ptr as AXUIElementRef)
            };
            result.push(elem);
        }
        Ok(result)
    }

    pub fn focused_window(&self) -> Result<AXUIElement, AXError> {
        let value = self.get_attribute(attr::FOCUSED_WINDOW)?;
        Ok(unsafe { AXUIElement::wrap_under_create_rule(value as AXUIElementRef) })
    }

    pub fn press(&self) -> Result<(), AXError> {
        let action = CFString::new(ACTION_PRESS);
        let err = unsafe {
            AXUIElementPerformAction(self.as_concrete_TypeRef(), action.as_concrete_TypeRef())
        };
        if err == AX_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(err)
        }
    }
}

pub fn describe_ax_error(err: AXError) -> &'static str {
    match err {
        AX_ERROR_SUCCESS => "success",
        AX_ERROR_FAILURE => "failure",
        AX_ERROR_INVALID_UIELEMENT => "invalid element",
        AX_ERROR_CANNOT_COMPLETE => "cannot complete",
        AX_ERROR_ATTRIBUTE_UNSUPPORTED => "attribute unsupported",
        AX_ERROR_API_DISABLED => "accessibility api disabled",
        AX_ERROR_NO_VALUE => "no value",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_ax_error() {
        assert_eq!(describe_ax_error(AX_ERROR_CANNOT_COMPLETE), "cannot complete");
        assert_eq!(describe_ax_error(AX_ERROR_API_DISABLED), "accessibility api disabled");
        assert_eq!(describe_ax_error(-1), "unknown error");
    }
}
