#![no_main]

use keyscope::{
    assembly::decode_stream,
    deobfuscation::{DecrypterConfig, ResourceDecrypter},
    emulation::EmulationLimits,
    metadata::{
        method::{Local, Method},
        token::Token,
        typesystem::CilFlavor,
    },
    Parser,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // first byte splits code from the encrypted payload
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let (code, payload) = rest.split_at(usize::from(split).min(rest.len()));

    let Ok(instructions) = decode_stream(&mut Parser::new(code), 0) else {
        return;
    };

    let locals = (0..4).map(|i| Local::new(i, CilFlavor::U4)).collect();
    let method = Method::new(Token::new(0x0600_0001), "fuzz", instructions, locals, vec![], true);

    let config =
        DecrypterConfig::default().with_limits(EmulationLimits::new().with_max_instructions(4096));
    if let Ok(mut decrypter) = ResourceDecrypter::with_config(&method, config) {
        let _ = decrypter.decrypt(&payload[..payload.len().min(256)]);
    }
});
