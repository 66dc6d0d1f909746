use tui_textarea::Input;

use super::BackendFailure;
use super::BackendResponse;
use super::PublishReceipt;
use super::Toast;

pub enum Event {
    BackendFailed(BackendFailure),
    BackendResponse(BackendResponse),
    PublishResponse(PublishReceipt),
    Toast(Toast),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLP(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UIScrollLast(),
    UITick(),
}
