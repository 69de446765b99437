use ffmpeg_next::Rational;

/// Compressed unit of one stream, either read from the container or produced
/// by the encoder.
pub struct RawPacket {
    packet: ffmpeg_next::codec::packet::Packet,
    time_base: Rational,
}

impl RawPacket {
    /// Copy `data` into a new packet tagged with `stream_index`.
    pub fn copy(stream_index: usize, data: &[u8], time_base: Rational) -> Self {
        let mut packet = ffmpeg_next::codec::packet::Packet::copy(data);
        packet.set_stream(stream_index);
        Self { packet, time_base }
    }

    pub fn pts(&self) -> Option<i64> {
        self.packet.pts()
    }

    pub fn size(&self) -> usize {
        self.packet.size()
    }

    pub fn index(&self) -> usize {
        self.packet.stream()
    }

    pub fn data(&self) -> &[u8] {
        self.packet.data().unwrap_or_default()
    }

    pub fn is_key(&self) -> bool {
        self.packet.is_key()
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn set_pts(&mut self, pts: Option<i64>) {
        self.packet.set_pts(pts);
    }

    pub fn packet(&self) -> &ffmpeg_next::codec::packet::Packet {
        &self.packet
    }
}

impl From<(ffmpeg_next::codec::packet::Packet, Rational)> for RawPacket {
    fn from((packet, time_base): (ffmpeg_next::codec::packet::Packet, Rational)) -> Self {
        Self { packet, time_base }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copied_packet_keeps_payload_and_stream() {
        let packet = RawPacket::copy(2, &[0, 0, 1, 0xb3, 7], Rational(1, 25));
        assert_eq!(packet.index(), 2);
        assert_eq!(packet.size(), 5);
        assert_eq!(packet.data(), &[0, 0, 1, 0xb3, 7]);
        assert_eq!(packet.time_base(), Rational(1, 25));
    }

    #[test]
    fn empty_packet_has_empty_payload() {
        let packet = RawPacket::from((ffmpeg_next::codec::packet::Packet::empty(), Rational(1, 1)));
        assert!(packet.data().is_empty());
        assert_eq!(packet.pts(), None);
    }
}
