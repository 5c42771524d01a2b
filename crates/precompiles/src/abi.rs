//! Solidity interfaces of the bridge precompiles.

use alloy::sol;

sol! {
    /// ERC-20 surface of a native ledger coin.
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);

        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function decreaseAllowance(address spender, uint256 subtractedValue)
            external
            returns (bool);
    }
}

sol! {
    /// WETH-style wrapping methods served next to [`IERC20`] for the native coin.
    #[derive(Debug, PartialEq, Eq)]
    interface IWERC20 {
        event Deposit(address indexed dst, uint256 wad);
        event Withdrawal(address indexed src, uint256 wad);

        function deposit() external payable;
        function withdraw(uint256 wad) external;
    }
}

sol! {
    /// ICS-20 fungible token transfer gateway.
    #[derive(Debug, PartialEq, Eq)]
    interface IICS20 {
        struct Height {
            uint64 revisionNumber;
            uint64 revisionHeight;
        }

        struct Hop {
            string portId;
            string channelId;
        }

        struct Denom {
            string base;
            Hop[] trace;
        }

        struct PageRequest {
            bytes key;
            uint64 offset;
            uint64 limit;
            bool countTotal;
            bool reverse;
        }

        struct PageResponse {
            bytes nextKey;
            uint64 total;
        }

        event IBCTransfer(
            address indexed sender,
            string indexed receiver,
            string sourcePort,
            string sourceChannel,
            string denom,
            uint256 amount,
            string memo
        );

        function transfer(
            string sourcePort,
            string sourceChannel,
            string denom,
            uint256 amount,
            address sender,
            string receiver,
            Height timeoutHeight,
            uint64 timeoutTimestamp,
            string memo
        ) external returns (uint64 nextSequence);

        function denoms(PageRequest pageRequest)
            external
            view
            returns (Denom[] denoms, PageResponse pageResponse);

        function denom(string hash) external view returns (Denom denom);

        function denomHash(string trace) external view returns (string hash);
    }
}
