//! C7: bounded-size, ASCII-only diagnostic renderings of frames and packets.
//!
//! Purely diagnostic — nothing here feeds back into decoding. Renderers write
//! into a caller-sized [`heapless::String`] via [`core::fmt::Write`] so a
//! buffer that is too small is a reported error, never a panic or truncated
//! silent output.

use core::fmt::Write;

use heapless::String;

use crate::packet::{
    BroadcastStopKind, DecoderFlagInstruction, Direction, FunctionGroupTwoKind, LocomotiveSpeed,
    Packet, Speed4Bit, Speed5Bit, Speed7Bit,
};

/// Renders `bytes` as space-separated uppercase hex pairs, e.g. `"01 6A 6B"`.
pub fn render_bytes<const N: usize>(bytes: &[u8]) -> Result<String<N>, core::fmt::Error> {
    let mut out = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ').map_err(|_| core::fmt::Error)?;
        }
        write!(out, "{b:02X}")?;
    }
    Ok(out)
}

fn render_direction(d: Direction) -> &'static str {
    match d {
        Direction::Forward => "Forward",
        Direction::Backward => "Backward",
    }
}

/// Renders a packet as bounded-length, JSON-like ASCII text, e.g.
/// `{"tag":"ResetForAllDecoders"}`.
pub fn render_packet<const N: usize>(packet: &Packet) -> Result<String<N>, core::fmt::Error> {
    let mut out = String::new();
    match packet {
        Packet::SpeedAndDirectionForLocomotive {
            address,
            direction,
            speed,
        } => {
            write!(
                out,
                r#"{{"tag":"SpeedAndDirectionForLocomotive","address":{address},"direction":"{}","speed":"#,
                render_direction(*direction)
            )?;
            write_locomotive_speed(&mut out, speed)?;
            out.push('}').map_err(|_| core::fmt::Error)?;
        }
        Packet::SpeedAndDirectionForMultiFunctionDecoder {
            address,
            direction,
            speed,
        } => {
            write!(
                out,
                r#"{{"tag":"SpeedAndDirectionForMultiFunctionDecoder","address":{address},"direction":"{}","speed":"#,
                render_direction(*direction)
            )?;
            write_locomotive_speed(&mut out, speed)?;
            out.push('}').map_err(|_| core::fmt::Error)?;
        }
        Packet::ResetForAllDecoders => {
            write!(out, r#"{{"tag":"ResetForAllDecoders"}}"#)?;
        }
        Packet::IdleForAllDecoders => {
            write!(out, r#"{{"tag":"IdleForAllDecoders"}}"#)?;
        }
        Packet::BroadcastStopForAllDecoders {
            kind,
            direction,
            direction_may_be_ignored,
        } => {
            let kind = match kind {
                BroadcastStopKind::Stop => "Stop",
                BroadcastStopKind::Shutdown => "Shutdown",
            };
            write!(
                out,
                r#"{{"tag":"BroadcastStopForAllDecoders","kind":"{kind}","direction":"{}","directionMayBeIgnored":{direction_may_be_ignored}}}"#,
                render_direction(*direction)
            )?;
        }
        Packet::ResetForMultiFunctionDecoder { address } => {
            write!(out, r#"{{"tag":"ResetForMultiFunctionDecoder","address":{address}}}"#)?;
        }
        Packet::HardResetForMultiFunctionDecoder { address } => {
            write!(
                out,
                r#"{{"tag":"HardResetForMultiFunctionDecoder","address":{address}}}"#
            )?;
        }
        Packet::FactoryTestInstruction { address, set, data } => match data {
            Some(d) => write!(
                out,
                r#"{{"tag":"FactoryTestInstruction","address":{address},"set":{set},"data":{d}}}"#
            )?,
            None => write!(
                out,
                r#"{{"tag":"FactoryTestInstruction","address":{address},"set":{set},"data":null}}"#
            )?,
        },
        Packet::SetDecoderFlags {
            address,
            set,
            subaddress,
            instruction,
        } => {
            let instruction = render_decoder_flag_instruction(*instruction);
            write!(
                out,
                r#"{{"tag":"SetDecoderFlags","address":{address},"set":{set},"subaddress":{subaddress},"instruction":"{instruction}"}}"#
            )?;
        }
        Packet::SetExtendedAddressing { address, set } => {
            write!(
                out,
                r#"{{"tag":"SetExtendedAddressing","address":{address},"set":{set}}}"#
            )?;
        }
        Packet::DecoderAcknowledgementRequest { address, set } => {
            write!(
                out,
                r#"{{"tag":"DecoderAcknowledgementRequest","address":{address},"set":{set}}}"#
            )?;
        }
        Packet::ConsistControl {
            address,
            direction,
            consist_address,
        } => {
            write!(
                out,
                r#"{{"tag":"ConsistControl","address":{address},"direction":"{}","consistAddress":{consist_address}}}"#,
                render_direction(*direction)
            )?;
        }
        Packet::SpeedStep128Control {
            address,
            direction,
            speed,
        } => {
            write!(
                out,
                r#"{{"tag":"SpeedStep128Control","address":{address},"direction":"{}","speed":"#,
                render_direction(*direction)
            )?;
            write_speed7(&mut out, *speed)?;
            out.push('}').map_err(|_| core::fmt::Error)?;
        }
        Packet::RestrictedSpeedStep {
            address,
            enabled,
            speed_step,
        } => {
            write!(
                out,
                r#"{{"tag":"RestrictedSpeedStep","address":{address},"enabled":{enabled},"speedStep":{speed_step}}}"#
            )?;
        }
        Packet::AnalogFunctionGroup {
            address,
            output_index,
            data,
        } => {
            write!(
                out,
                r#"{{"tag":"AnalogFunctionGroup","address":{address},"outputIndex":{output_index},"data":{data}}}"#
            )?;
        }
        Packet::FunctionGroupOne {
            address,
            fl,
            f1,
            f2,
            f3,
            f4,
        } => {
            write!(
                out,
                r#"{{"tag":"FunctionGroupOne","address":{address},"fl":{fl},"f1":{f1},"f2":{f2},"f3":{f3},"f4":{f4}}}"#
            )?;
        }
        Packet::FunctionGroupTwo {
            address,
            kind,
            functions,
        } => {
            let kind = match kind {
                FunctionGroupTwoKind::F5ToF8 => "F5ToF8",
                FunctionGroupTwoKind::F9ToF12 => "F9ToF12",
            };
            write!(
                out,
                r#"{{"tag":"FunctionGroupTwo","address":{address},"kind":"{kind}","functions":[{},{},{},{}]}}"#,
                functions[0], functions[1], functions[2], functions[3]
            )?;
        }
        Packet::BinaryStateControlLong {
            address,
            binary_state_address,
            state,
        } => {
            write!(
                out,
                r#"{{"tag":"BinaryStateControlLong","address":{address},"binaryStateAddress":{binary_state_address},"state":{state}}}"#
            )?;
        }
        Packet::BinaryStateControlShort {
            address,
            binary_state_address,
            state,
        } => {
            write!(
                out,
                r#"{{"tag":"BinaryStateControlShort","address":{address},"binaryStateAddress":{binary_state_address},"state":{state}}}"#
            )?;
        }
        Packet::FeatureExpansionF13ToF20 { address, functions } => {
            write!(
                out,
                r#"{{"tag":"FeatureExpansionF13ToF20","address":{address},"functions":{functions}}}"#
            )?;
        }
        Packet::FeatureExpansionF21ToF28 { address, functions } => {
            write!(
                out,
                r#"{{"tag":"FeatureExpansionF21ToF28","address":{address},"functions":{functions}}}"#
            )?;
        }
    }
    Ok(out)
}

fn write_locomotive_speed<const N: usize>(
    out: &mut String<N>,
    speed: &LocomotiveSpeed,
) -> core::fmt::Result {
    match speed {
        LocomotiveSpeed::FourBit { speed, fl } => {
            write!(out, r#"{{"fourBit":"#)?;
            write_speed4(out, *speed)?;
            write!(out, r#","fl":{fl}}}"#)
        }
        LocomotiveSpeed::FiveBit { speed } => {
            write!(out, r#"{{"fiveBit":"#)?;
            write_speed5(out, *speed)?;
            out.push('}').map_err(|_| core::fmt::Error)
        }
    }
}

/// Writes a speed value as `{"kind":"Stop"}` or `{"kind":"Step","value":N}`,
/// always carrying the numeric step when there is one — two different step
/// counts must never render identically.
fn write_speed4<const N: usize>(out: &mut String<N>, speed: Speed4Bit) -> core::fmt::Result {
    match speed {
        Speed4Bit::Stop => write!(out, r#"{{"kind":"Stop"}}"#),
        Speed4Bit::EmergencyStop => write!(out, r#"{{"kind":"EmergencyStop"}}"#),
        Speed4Bit::Step(n) => write!(out, r#"{{"kind":"Step","value":{n}}}"#),
    }
}

fn write_speed5<const N: usize>(out: &mut String<N>, speed: Speed5Bit) -> core::fmt::Result {
    match speed {
        Speed5Bit::Stop => write!(out, r#"{{"kind":"Stop"}}"#),
        Speed5Bit::StopDirectionMayBeIgnored => {
            write!(out, r#"{{"kind":"StopDirectionMayBeIgnored"}}"#)
        }
        Speed5Bit::EmergencyStop => write!(out, r#"{{"kind":"EmergencyStop"}}"#),
        Speed5Bit::EmergencyStopDirectionMayBeIgnored => {
            write!(out, r#"{{"kind":"EmergencyStopDirectionMayBeIgnored"}}"#)
        }
        Speed5Bit::Step(n) => write!(out, r#"{{"kind":"Step","value":{n}}}"#),
    }
}

fn write_speed7<const N: usize>(out: &mut String<N>, speed: Speed7Bit) -> core::fmt::Result {
    match speed {
        Speed7Bit::Stop => write!(out, r#"{{"kind":"Stop"}}"#),
        Speed7Bit::EmergencyStop => write!(out, r#"{{"kind":"EmergencyStop"}}"#),
        Speed7Bit::Step(n) => write!(out, r#"{{"kind":"Step","value":{n}}}"#),
    }
}

fn render_decoder_flag_instruction(instruction: DecoderFlagInstruction) -> &'static str {
    match instruction {
        DecoderFlagInstruction::Disable111 => "Disable111",
        DecoderFlagInstruction::DisableDecoderAckRequest => "DisableDecoderAckRequest",
        DecoderFlagInstruction::ActivateBiDi => "ActivateBiDi",
        DecoderFlagInstruction::SetBiDi => "SetBiDi",
        DecoderFlagInstruction::Set111 => "Set111",
        DecoderFlagInstruction::Accept111 => "Accept111",
    }
}
