//! Script preludes installed when a context is created

/// Helper globals enabled by `enable_extensions`
pub const EXTENSIONS_PRELUDE: &str = r#"
(function (global) {
  const chars = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

  global.btoa = function btoa(input) {
    const str = String(input);
    let out = "";
    for (let i = 0; i < str.length; i += 3) {
      const a = str.charCodeAt(i);
      const b = str.charCodeAt(i + 1);
      const c = str.charCodeAt(i + 2);
      if (a > 255 || b > 255 || c > 255) {
        throw new Error("btoa: character out of Latin1 range");
      }
      const triple = (a << 16) | ((b || 0) << 8) | (c || 0);
      out += chars[(triple >> 18) & 63] + chars[(triple >> 12) & 63];
      out += i + 1 < str.length ? chars[(triple >> 6) & 63] : "=";
      out += i + 2 < str.length ? chars[triple & 63] : "=";
    }
    return out;
  };

  global.atob = function atob(input) {
    const str = String(input).replace(/[\s=]+/g, "");
    let out = "";
    let buffer = 0;
    let bits = 0;
    for (let i = 0; i < str.length; i++) {
      const idx = chars.indexOf(str[i]);
      if (idx < 0) {
        throw new Error("atob: invalid character");
      }
      buffer = (buffer << 6) | idx;
      bits += 6;
      if (bits >= 8) {
        bits -= 8;
        out += String.fromCharCode((buffer >> bits) & 255);
      }
    }
    return out;
  };

  global.structuredClone = function structuredClone(value) {
    return value === undefined ? undefined : JSON.parse(JSON.stringify(value));
  };
})(globalThis);
"#;

/// Replace `Math.random` with a deterministic generator (mulberry32)
pub fn seeded_random_prelude(seed: u32) -> String {
    format!(
        r#"
(function (seed) {{
  let state = seed >>> 0;
  Math.random = function random() {{
    state = (state + 0x6D2B79F5) >>> 0;
    let t = state;
    t = Math.imul(t ^ (t >>> 15), t | 1);
    t ^= t + Math.imul(t ^ (t >>> 7), t | 61);
    return ((t ^ (t >>> 14)) >>> 0) / 4294967296;
  }};
}})({seed});
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_embedded() {
        let prelude = seeded_random_prelude(42);
        assert!(prelude.contains("})(42);"));
        assert!(prelude.contains("Math.random = function random()"));
    }
}
