//! Crypt module: Base64, digests and HMAC.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use md5::{Digest as _, Md5};
use sha2::Sha256;
use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::Heap,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum CryptFn {
    #[strum(serialize = "encode")]
    Encode,
    #[strum(serialize = "decode")]
    Decode,
    #[strum(serialize = "md5")]
    Md5,
    #[strum(serialize = "sha256")]
    Sha256,
    #[strum(serialize = "hmac")]
    Hmac,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    module_object(
        heap,
        &[
            ("encode", NativeFn::Crypt(CryptFn::Encode)),
            ("decode", NativeFn::Crypt(CryptFn::Decode)),
            ("md5", NativeFn::Crypt(CryptFn::Md5)),
            ("sha256", NativeFn::Crypt(CryptFn::Sha256)),
            ("hmac", NativeFn::Crypt(CryptFn::Hmac)),
        ],
    )
}

fn string_arg(heap: &mut Heap, func: CryptFn, args: &[Value], index: usize) -> RunResult<String> {
    match args.get(index).and_then(|a| a.as_str(heap)) {
        Some(s) => Ok(s.to_owned()),
        None => Err(RunError::type_error(heap, format!("Crypt.{func} expects a string"))),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn call(heap: &mut Heap, func: CryptFn, args: &[Value]) -> RunResult<Value> {
    match func {
        CryptFn::Encode => {
            let input = string_arg(heap, func, args, 0)?;
            let encoded = BASE64.encode(input.as_bytes());
            Ok(heap.alloc_str(encoded))
        }
        CryptFn::Decode => {
            let input = string_arg(heap, func, args, 0)?;
            let bytes = BASE64
                .decode(input.as_bytes())
                .map_err(|err| RunError::host_error(heap, format!("Crypt.decode: {err}")))?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Ok(heap.alloc_str(text))
        }
        CryptFn::Md5 => {
            let input = string_arg(heap, func, args, 0)?;
            let digest = Md5::digest(input.as_bytes());
            Ok(heap.alloc_str(hex(&digest)))
        }
        CryptFn::Sha256 => {
            let input = string_arg(heap, func, args, 0)?;
            let digest = Sha256::digest(input.as_bytes());
            Ok(heap.alloc_str(hex(&digest)))
        }
        CryptFn::Hmac => {
            let key = string_arg(heap, func, args, 0)?;
            let message = string_arg(heap, func, args, 1)?;
            let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
                .map_err(|err| RunError::host_error(heap, format!("Crypt.hmac: {err}")))?;
            mac.update(message.as_bytes());
            let digest = mac.finalize().into_bytes();
            Ok(heap.alloc_str(hex(&digest)))
        }
    }
}
