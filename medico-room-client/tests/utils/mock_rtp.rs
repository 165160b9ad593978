use async_trait::async_trait;
use bytes::Bytes;
use medico_room_client::RtpSource;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use webrtc::rtp::header::Header;
use webrtc::rtp::packet::Packet;

/// Incoming track fed by the test. Dropping the feed ends the track.
pub struct MockRtpSource {
    mime_type: String,
    packets: Mutex<mpsc::UnboundedReceiver<Packet>>,
}

impl MockRtpSource {
    pub fn new(mime_type: &str) -> (Arc<Self>, RtpFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Arc::new(Self {
            mime_type: mime_type.to_owned(),
            packets: Mutex::new(rx),
        });
        (source, RtpFeed { tx, sequence: 0 })
    }
}

#[async_trait]
impl RtpSource for MockRtpSource {
    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    async fn read_rtp(&self) -> Option<Packet> {
        self.packets.lock().await.recv().await
    }
}

pub struct RtpFeed {
    tx: mpsc::UnboundedSender<Packet>,
    sequence: u16,
}

impl RtpFeed {
    /// One 20 ms Opus frame.
    pub fn opus_frame(&mut self) {
        self.push(Bytes::from_static(&[0xfc, 0xff, 0xfe]), 960);
    }

    /// One single-packet VP8 key frame.
    pub fn vp8_key_frame(&mut self) {
        self.push(Bytes::from_static(&[0x10, 0x00, 0x9d, 0x01, 0x2a]), 3000);
    }

    fn push(&mut self, payload: Bytes, ticks: u32) {
        self.sequence = self.sequence.wrapping_add(1);
        let packet = Packet {
            header: Header {
                version: 2,
                marker: true,
                sequence_number: self.sequence,
                timestamp: u32::from(self.sequence) * ticks,
                ..Default::default()
            },
            payload,
        };
        let _ = self.tx.send(packet);
    }
}
