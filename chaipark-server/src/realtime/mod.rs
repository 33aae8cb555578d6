//! 实时推送
//!
//! - [`bus`]: 订单生命周期事件总线 ([`OrderEventPublisher`])
//! - [`socket`]: socket.io 房间管理和事件转发

pub mod bus;
pub mod socket;

pub use bus::{OrderEventBus, OrderEventPublisher, PublishError};
pub use socket::{ADMIN_ROOM, register_handlers, run_event_bridge, target_rooms, user_room};

use socketioxide::SocketIo;
use socketioxide::layer::SocketIoLayer;

/// socket.io handle + tower layer
#[derive(Clone)]
pub struct RealtimeHub {
    pub io: SocketIo,
    pub layer: SocketIoLayer,
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (layer, io) = SocketIo::new_layer();
        Self { io, layer }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
